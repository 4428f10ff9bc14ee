//! Fit scoring: pluggable, trait-based scorer that measures a parsed resume
//! against a job posting.
//!
//! Default: `LlmFitScorer` (one model call, weighted 40/40/20 rubric).
//! Alternative: `KeywordFitScorer` (pure-Rust, deterministic, no external call).
//!
//! `AppState` holds an `Arc<dyn FitScorer>`, chosen at startup via config.
//! Scoring never fails: every error path degrades to fixed conservative scores.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::llm_client::{json_repair, GenerationConfig, LlmClient};
use crate::models::application::ApplicationStatus;
use crate::models::job::JobDetails;
use crate::models::resume::ParsedResume;
use crate::resume::merge::{similarity, DUPLICATE_SIMILARITY};
use crate::screening::prompts::build_fit_score_prompt;

/// Score assigned when the resume carries neither skills nor experience.
pub const MINIMAL_SCORE: f64 = 5.0;
/// Score for a field the model omitted or returned as a non-number, and for an
/// unparseable response.
pub const FALLBACK_SCORE: f64 = 15.0;
/// Score when the scoring call itself failed.
pub const ERROR_SCORE: f64 = 10.0;

pub const SKILL_WEIGHT: f64 = 0.4;
pub const EXPERIENCE_WEIGHT: f64 = 0.4;
pub const EDUCATION_WEIGHT: f64 = 0.2;

/// Default `overall_fit_score` needed for selection.
pub const DEFAULT_FIT_THRESHOLD: f64 = 70.0;
/// `skill_match_score` needed for selection regardless of the overall threshold.
pub const MIN_SKILL_MATCH: f64 = 60.0;

const PARSING_FAILED_REASONING: &str = "Resume parsing failed or insufficient information provided";
const INCOMPLETE_REASONING: &str = "Score calculation incomplete";

// ────────────────────────────────────────────────────────────────────────────
// Output data model (shared across all scorer backends)
// ────────────────────────────────────────────────────────────────────────────

/// Component scores, each in `0..=100`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitScores {
    pub skill_match_score: f64,
    pub experience_relevance_score: f64,
    pub education_alignment_score: f64,
    pub overall_fit_score: f64,
    pub reasoning: String,
}

impl FitScores {
    /// The same score on every component.
    pub fn uniform(score: f64, reasoning: impl Into<String>) -> Self {
        Self {
            skill_match_score: score,
            experience_relevance_score: score,
            education_alignment_score: score,
            overall_fit_score: score,
            reasoning: reasoning.into(),
        }
    }

    pub fn weighted_average(&self) -> f64 {
        weighted_average(
            self.skill_match_score,
            self.experience_relevance_score,
            self.education_alignment_score,
        )
    }
}

fn weighted_average(skills: f64, experience: f64, education: f64) -> f64 {
    SKILL_WEIGHT * skills + EXPERIENCE_WEIGHT * experience + EDUCATION_WEIGHT * education
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The fit scorer trait. Implement this to swap backends without touching
/// the workflow or handler code.
///
/// Carried in `AppState` as `Arc<dyn FitScorer>`.
#[async_trait]
pub trait FitScorer: Send + Sync {
    async fn score(&self, resume: &ParsedResume, job: &JobDetails) -> FitScores;

    /// Backend label for logs ("llm" | "keyword").
    fn backend(&self) -> &'static str;
}

/// Scores `resume` against `job`. A resume without skills and experience gets
/// `MINIMAL_SCORE` everywhere and no backend is consulted.
pub async fn calculate_fit_score(
    scorer: &dyn FitScorer,
    resume: &ParsedResume,
    job: &JobDetails,
) -> FitScores {
    if resume.is_parsing_failure() {
        warn!("Resume parsing failed - using minimal score");
        return FitScores::uniform(MINIMAL_SCORE, PARSING_FAILED_REASONING);
    }

    let scores = scorer.score(resume, job).await;
    info!(
        "Fit score ({}): overall {:.1}, skills {:.1}, experience {:.1}, education {:.1}",
        scorer.backend(),
        scores.overall_fit_score,
        scores.skill_match_score,
        scores.experience_relevance_score,
        scores.education_alignment_score
    );
    scores
}

/// `Selected` iff the overall score meets `threshold` and the skill score meets
/// `MIN_SKILL_MATCH`.
pub fn decide_status(scores: &FitScores, threshold: f64) -> ApplicationStatus {
    if scores.overall_fit_score >= threshold && scores.skill_match_score >= MIN_SKILL_MATCH {
        ApplicationStatus::Selected
    } else {
        ApplicationStatus::Rejected
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmFitScorer: default implementation
// ────────────────────────────────────────────────────────────────────────────

/// Semantic fit scorer: one call through the rate-limited envelope.
pub struct LlmFitScorer(pub LlmClient);

#[async_trait]
impl FitScorer for LlmFitScorer {
    async fn score(&self, resume: &ParsedResume, job: &JobDetails) -> FitScores {
        let prompt = match (
            serde_json::to_string_pretty(job),
            serde_json::to_string_pretty(resume),
        ) {
            (Ok(job_json), Ok(resume_json)) => build_fit_score_prompt(&job_json, &resume_json),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Could not serialize scoring input: {e}");
                return FitScores::uniform(ERROR_SCORE, format!("Score calculation error: {e}"));
            }
        };

        let text = match self.0.call(&prompt, &GenerationConfig::default()).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Error in detailed score calculation: {e}");
                return FitScores::uniform(ERROR_SCORE, format!("Score calculation error: {e}"));
            }
        };

        match json_repair::parse_lenient::<Value>(&text) {
            Ok(value) => normalize_scores(&value),
            Err(e) => {
                warn!("JSON parsing error in score calculation: {e}");
                FitScores::uniform(FALLBACK_SCORE, format!("Score parsing failed: {e}"))
            }
        }
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

/// Turns a model response into bounded scores.
///
/// Missing or non-numeric components become `FALLBACK_SCORE`, every component
/// is clamped to `0..=100`, and an overall of zero is replaced by the weighted
/// average of the components.
pub fn normalize_scores(value: &Value) -> FitScores {
    let empty = Map::new();
    let object = value.as_object().unwrap_or(&empty);

    let skill_match_score = numeric_score(object.get("skill_match_score"));
    let experience_relevance_score = numeric_score(object.get("experience_relevance_score"));
    let education_alignment_score = numeric_score(object.get("education_alignment_score"));
    let mut overall_fit_score = numeric_score(object.get("overall_fit_score"));

    if overall_fit_score == 0.0 {
        overall_fit_score = weighted_average(
            skill_match_score,
            experience_relevance_score,
            education_alignment_score,
        );
    }

    let reasoning = match object.get("reasoning") {
        None | Some(Value::Null) => INCOMPLETE_REASONING.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    FitScores {
        skill_match_score,
        experience_relevance_score,
        education_alignment_score,
        overall_fit_score,
        reasoning,
    }
}

fn numeric_score(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(score) if score.is_finite() => score.clamp(0.0, 100.0),
        _ => FALLBACK_SCORE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordFitScorer: deterministic alternative
// ────────────────────────────────────────────────────────────────────────────

/// Pure-Rust overlap scorer. Fast, deterministic, no LLM call.
///
/// Algorithm:
/// 1. skills: share of the job's required skills covered by a resume skill
///    (substring either way, or near-duplicate similarity)
/// 2. experience: word overlap between experience entries and the job's
///    description plus responsibilities, over the larger vocabulary
/// 3. education: share of qualifications sharing a word with an education entry
/// 4. overall = 0.4 · skills + 0.4 · experience + 0.2 · education
pub struct KeywordFitScorer;

#[async_trait]
impl FitScorer for KeywordFitScorer {
    async fn score(&self, resume: &ParsedResume, job: &JobDetails) -> FitScores {
        compute_keyword_fit(resume, job)
    }

    fn backend(&self) -> &'static str {
        "keyword"
    }
}

fn compute_keyword_fit(resume: &ParsedResume, job: &JobDetails) -> FitScores {
    let matched: Vec<&str> = job
        .required_skills
        .iter()
        .filter(|required| resume.skills.iter().any(|skill| skill_covers(skill, required)))
        .map(String::as_str)
        .collect();
    let skill_match_score = percentage(matched.len(), job.required_skills.len());

    let experience_words = words(resume.experience.iter().flat_map(|e| {
        std::iter::once(e.title.as_str()).chain(e.responsibilities.iter().map(String::as_str))
    }));
    let job_words = words(
        std::iter::once(job.description.as_str())
            .chain(job.responsibilities.iter().map(String::as_str)),
    );
    let common = experience_words.intersection(&job_words).count();
    let experience_relevance_score =
        percentage(common, experience_words.len().max(job_words.len()));

    let education_words = words(
        resume
            .education
            .iter()
            .flat_map(|e| [e.degree.as_str(), e.institution.as_str()]),
    );
    let aligned = job
        .qualifications
        .iter()
        .filter(|q| !words([q.as_str()]).is_disjoint(&education_words))
        .count();
    let education_alignment_score = percentage(aligned, job.qualifications.len());

    let overall_fit_score = weighted_average(
        skill_match_score,
        experience_relevance_score,
        education_alignment_score,
    );

    let reasoning = if matched.is_empty() {
        format!(
            "No required skills matched. Experience overlap {common} words; {aligned}/{} qualifications aligned.",
            job.qualifications.len()
        )
    } else {
        format!(
            "Matched {}/{} required skills ({}). Experience overlap {common} words; {aligned}/{} qualifications aligned.",
            matched.len(),
            job.required_skills.len(),
            matched.join(", "),
            job.qualifications.len()
        )
    };

    FitScores {
        skill_match_score,
        experience_relevance_score,
        education_alignment_score,
        overall_fit_score,
        reasoning,
    }
}

fn skill_covers(skill: &str, required: &str) -> bool {
    let skill = skill.trim().to_lowercase();
    let required = required.trim().to_lowercase();
    if skill.is_empty() || required.is_empty() {
        return false;
    }
    required.contains(&skill)
        || skill.contains(&required)
        || similarity(&skill, &required) >= DUPLICATE_SIMILARITY
}

const STOP_WORDS: &[&str] = &["and", "the", "for", "with", "you", "our", "are", "will", "from"];

/// Lowercase words of three or more characters, minus common filler.
fn words<'a>(texts: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    texts
        .into_iter()
        .flat_map(|t| t.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#')))
        .filter(|w| w.chars().count() >= 3)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 100.0).clamp(0.0, 100.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{client, Scripted, ScriptedGenerator};
    use crate::models::resume::{EducationEntry, ExperienceEntry};
    use serde_json::json;

    fn make_resume() -> ParsedResume {
        ParsedResume {
            education: vec![EducationEntry {
                degree: "PhD Computer Science".to_string(),
                institution: "Stanford University".to_string(),
                year: "2018".to_string(),
            }],
            skills: vec!["Machine Learning".to_string(), "Python".to_string()],
            experience: vec![ExperienceEntry {
                title: "Assistant Professor".to_string(),
                company: "State University".to_string(),
                duration: "2018-2024".to_string(),
                responsibilities: vec!["Taught undergraduate machine learning courses".to_string()],
            }],
            projects: vec![],
            parsing_error: None,
        }
    }

    fn make_job() -> JobDetails {
        JobDetails {
            description: "Faculty role teaching machine learning".to_string(),
            responsibilities: vec!["Teach undergraduate courses".to_string()],
            required_skills: vec!["Python".to_string(), "Deep Learning".to_string()],
            qualifications: vec!["PhD in Computer Science or related field".to_string()],
            error: None,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "Expected {expected}, got {actual}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_resume_gets_minimal_score_without_calls() {
        let backend = ScriptedGenerator::texts(vec![r#"{"overall_fit_score": 99}"#]);
        let scorer = LlmFitScorer(client(backend.clone()));

        let scores =
            calculate_fit_score(&scorer, &ParsedResume::failed("boom"), &make_job()).await;

        assert_eq!(scores, FitScores::uniform(MINIMAL_SCORE, PARSING_FAILED_REASONING));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_llm_scores_are_returned() {
        let backend = ScriptedGenerator::texts(vec![
            r#"```json
{"skill_match_score": 80, "experience_relevance_score": 70, "education_alignment_score": 90, "overall_fit_score": 78, "reasoning": "Strong teaching record"}
```"#,
        ]);
        let scorer = LlmFitScorer(client(backend.clone()));

        let scores = calculate_fit_score(&scorer, &make_resume(), &make_job()).await;

        assert_close(scores.skill_match_score, 80.0);
        assert_close(scores.overall_fit_score, 78.0);
        assert_eq!(scores.reasoning, "Strong teaching record");
        let prompt = &backend.prompts()[0];
        assert!(prompt.contains("Deep Learning"));
        assert!(prompt.contains("Stanford University"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_response_scores_fallback() {
        let backend = ScriptedGenerator::texts(vec!["The candidate looks promising."]);
        let scorer = LlmFitScorer(client(backend));

        let scores = calculate_fit_score(&scorer, &make_resume(), &make_job()).await;

        assert_close(scores.overall_fit_score, FALLBACK_SCORE);
        assert_close(scores.skill_match_score, FALLBACK_SCORE);
        assert!(scores.reasoning.starts_with("Score parsing failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_score_error_value() {
        let backend =
            ScriptedGenerator::new(vec![Scripted::Quota, Scripted::Quota, Scripted::Quota]);
        let scorer = LlmFitScorer(client(backend.clone()));

        let scores = calculate_fit_score(&scorer, &make_resume(), &make_job()).await;

        assert_eq!(backend.calls(), 3);
        assert_close(scores.overall_fit_score, ERROR_SCORE);
        assert_close(scores.education_alignment_score, ERROR_SCORE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_failure_scores_error_value() {
        let backend = ScriptedGenerator::new(vec![Scripted::Fail(500)]);
        let scorer = LlmFitScorer(client(backend));

        let scores = scorer.score(&make_resume(), &make_job()).await;
        assert_eq!(scores.skill_match_score, ERROR_SCORE);
    }

    #[test]
    fn test_normalize_clamps_and_backfills() {
        let scores = normalize_scores(&json!({
            "skill_match_score": 140,
            "experience_relevance_score": "72.5",
            "education_alignment_score": "n/a"
        }));
        assert_close(scores.skill_match_score, 100.0);
        assert_close(scores.experience_relevance_score, 72.5);
        assert_close(scores.education_alignment_score, FALLBACK_SCORE);
        assert_close(scores.overall_fit_score, FALLBACK_SCORE);
        assert_eq!(scores.reasoning, INCOMPLETE_REASONING);
    }

    #[test]
    fn test_normalize_negative_scores_clamp_to_zero() {
        let scores = normalize_scores(&json!({
            "skill_match_score": -20,
            "experience_relevance_score": 50,
            "education_alignment_score": 50,
            "overall_fit_score": 40,
            "reasoning": "ok"
        }));
        assert_close(scores.skill_match_score, 0.0);
        assert_close(scores.overall_fit_score, 40.0);
    }

    #[test]
    fn test_zero_overall_is_replaced_by_weighted_average() {
        let scores = normalize_scores(&json!({
            "skill_match_score": 80,
            "experience_relevance_score": 60,
            "education_alignment_score": 50,
            "overall_fit_score": 0,
            "reasoning": "computed"
        }));
        assert_close(scores.overall_fit_score, 66.0);
        assert_close(scores.weighted_average(), 66.0);
    }

    #[test]
    fn test_non_object_response_normalizes_to_fallback() {
        let scores = normalize_scores(&json!([1, 2, 3]));
        assert_close(scores.overall_fit_score, FALLBACK_SCORE);
    }

    #[test]
    fn test_selection_requires_both_thresholds() {
        let mut scores = FitScores::uniform(70.0, "");
        scores.skill_match_score = 60.0;
        assert_eq!(decide_status(&scores, 70.0), ApplicationStatus::Selected);

        scores.overall_fit_score = 69.9;
        assert_eq!(decide_status(&scores, 70.0), ApplicationStatus::Rejected);

        scores.overall_fit_score = 95.0;
        scores.skill_match_score = 59.9;
        assert_eq!(decide_status(&scores, 70.0), ApplicationStatus::Rejected);
    }

    #[test]
    fn test_selection_honours_configured_threshold() {
        let scores = FitScores::uniform(65.0, "");
        assert_eq!(decide_status(&scores, 70.0), ApplicationStatus::Rejected);
        assert_eq!(decide_status(&scores, 60.0), ApplicationStatus::Selected);
    }

    #[tokio::test]
    async fn test_keyword_scorer_matches_required_skills() {
        let scores = calculate_fit_score(&KeywordFitScorer, &make_resume(), &make_job()).await;

        // Python matches, Deep Learning does not.
        assert_close(scores.skill_match_score, 50.0);
        assert_close(scores.education_alignment_score, 100.0);
        assert!(scores.experience_relevance_score > 0.0);
        assert!(scores.reasoning.contains("Python"));
        assert_close(scores.overall_fit_score, scores.weighted_average());
    }

    #[tokio::test]
    async fn test_keyword_scorer_without_requirements_scores_zero_skills() {
        let job = JobDetails {
            required_skills: vec![],
            qualifications: vec![],
            ..make_job()
        };
        let scores = KeywordFitScorer.score(&make_resume(), &job).await;
        assert_close(scores.skill_match_score, 0.0);
        assert_close(scores.education_alignment_score, 0.0);
        assert!(scores.overall_fit_score <= 100.0);
    }

    #[test]
    fn test_skill_cover_is_case_insensitive() {
        assert!(skill_covers("python", "Python 3"));
        assert!(skill_covers("Kubernetes (k8s)", "kubernetes"));
        assert!(!skill_covers("", "Rust"));
        assert!(!skill_covers("Java", "Go"));
    }
}
