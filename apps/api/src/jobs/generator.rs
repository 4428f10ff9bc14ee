//! Job posting generator: expands a title and salary into full posting content.
//!
//! Flow: prompt → envelope call → lenient JSON parse → validate → clean.
//! Output that is not JSON at all goes through a sectioned-text parser instead.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::ExtractionError;
use crate::jobs::prompts::build_job_details_prompt;
use crate::llm_client::{json_repair, GenerationConfig, LlmClient};
use crate::models::job::JobDetails;

/// Filler for a list section the model left empty.
pub const TO_BE_SPECIFIED: &str = "To be specified";

const LIST_FIELDS: [&str; 3] = ["responsibilities", "required_skills", "qualifications"];

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s*").expect("valid numbered-item regex"));

#[derive(Clone)]
pub struct JobPostingGenerator {
    llm: LlmClient,
}

impl JobPostingGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Generates posting content. A blank title is rejected; every other
    /// failure yields empty details with `error` set.
    pub async fn generate_job_details(
        &self,
        title: &str,
        salary: f64,
    ) -> Result<JobDetails, ExtractionError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ExtractionError::EmptyOrInvalidInput);
        }

        match self.generate(title, salary).await {
            Ok(details) => Ok(details),
            Err(e) => {
                let message = format!("Error generating job details: {e}");
                warn!("{message}");
                Ok(JobDetails::failed(message))
            }
        }
    }

    async fn generate(&self, title: &str, salary: f64) -> Result<JobDetails, ExtractionError> {
        let prompt = build_job_details_prompt(title, salary);
        info!("Generating job details for '{title}'");

        let text = self.llm.call(&prompt, &GenerationConfig::job_posting()).await?;

        match json_repair::parse_lenient::<Value>(&text) {
            Ok(value) => details_from_value(&value),
            Err(e) => {
                warn!("Failed to parse JSON job details, falling back to sectioned text: {e}");
                Ok(parse_sectioned_text(&text, title, salary))
            }
        }
    }
}

/// Validates a JSON response: all four fields present, `description` a
/// string, each list a non-empty array of text once cleaned.
pub fn details_from_value(value: &Value) -> Result<JobDetails, ExtractionError> {
    let object = value.as_object().ok_or_else(|| {
        ExtractionError::MalformedResponse("job details are not a JSON object".to_string())
    })?;

    let description = match object.get("description") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            return Err(ExtractionError::MalformedResponse(
                "Field 'description' must be a string".to_string(),
            ))
        }
        None => {
            return Err(ExtractionError::MalformedResponse(
                "Missing required field: description".to_string(),
            ))
        }
    };

    let mut lists = Vec::with_capacity(LIST_FIELDS.len());
    for field in LIST_FIELDS {
        let items = match object.get(field) {
            Some(Value::Array(items)) => clean_list(items.iter().filter_map(item_text)),
            Some(_) => {
                return Err(ExtractionError::MalformedResponse(format!(
                    "Field '{field}' must be a non-empty array"
                )))
            }
            None => {
                return Err(ExtractionError::MalformedResponse(format!(
                    "Missing required field: {field}"
                )))
            }
        };
        if items.is_empty() {
            return Err(ExtractionError::MalformedResponse(format!(
                "Field '{field}' must be a non-empty array"
            )));
        }
        lists.push(items);
    }

    let [responsibilities, required_skills, qualifications]: [Vec<String>; 3] = lists
        .try_into()
        .map_err(|_| ExtractionError::MalformedResponse("unexpected field count".to_string()))?;

    Ok(JobDetails {
        description,
        responsibilities,
        required_skills,
        qualifications,
        error: None,
    })
}

fn item_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Trims, drops blanks and removes exact duplicates, keeping first occurrences.
fn clean_list(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty() && seen.insert(item.clone()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Description,
    Responsibilities,
    RequiredSkills,
    Qualifications,
}

impl Section {
    /// The section a header line switches to, if it is one.
    fn from_header(lower_line: &str) -> Option<Self> {
        const HEADERS: [(Section, &[&str]); 4] = [
            (
                Section::Description,
                &["job description", "position description", "overview", "about the role"],
            ),
            (
                Section::Responsibilities,
                &["responsibilities", "duties", "role includes", "you will"],
            ),
            (
                Section::RequiredSkills,
                &["required skills", "skills", "requirements", "competencies"],
            ),
            (
                Section::Qualifications,
                &["qualifications", "education", "experience required"],
            ),
        ];

        HEADERS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower_line.contains(k)))
            .map(|(section, _)| *section)
    }
}

/// Recovers job details from free text organised under section headings.
///
/// Lines before the first heading are ignored. Sections the text never fills
/// get a generated description or `TO_BE_SPECIFIED`.
pub fn parse_sectioned_text(text: &str, title: &str, salary: f64) -> JobDetails {
    let mut description = String::new();
    let mut responsibilities = Vec::new();
    let mut required_skills = Vec::new();
    let mut qualifications = Vec::new();
    let mut current = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        if let Some(section) = Section::from_header(&lower) {
            current = Some(section);
            continue;
        }

        let target = match current {
            None => continue,
            Some(Section::Description) => {
                description.push_str(line);
                description.push(' ');
                continue;
            }
            Some(Section::Responsibilities) => &mut responsibilities,
            Some(Section::RequiredSkills) => &mut required_skills,
            Some(Section::Qualifications) => &mut qualifications,
        };

        let item = strip_list_marker(line);
        let lower_item = item.to_lowercase();
        let is_label = ["description:", "responsibilities:", "skills:", "qualifications:"]
            .iter()
            .any(|label| lower_item.starts_with(label));
        if !item.is_empty() && !is_label {
            target.push(item);
        }
    }

    let mut description = description.trim().to_string();
    if description.is_empty() {
        description = format!(
            "We are seeking a qualified candidate for the position of {title} with a competitive salary of ${}.",
            format_salary(salary)
        );
    }

    JobDetails {
        description,
        responsibilities: or_to_be_specified(clean_list(responsibilities)),
        required_skills: or_to_be_specified(clean_list(required_skills)),
        qualifications: or_to_be_specified(clean_list(qualifications)),
        error: None,
    }
}

fn strip_list_marker(line: &str) -> String {
    let stripped = line
        .trim_start_matches(|c: char| matches!(c, '-' | '*' | '•' | '○') || c.is_whitespace())
        .trim();
    NUMBERED_ITEM.replace(stripped, "").trim().to_string()
}

fn or_to_be_specified(items: Vec<String>) -> Vec<String> {
    if items.is_empty() {
        vec![TO_BE_SPECIFIED.to_string()]
    } else {
        items
    }
}

/// Two decimals with thousands separators: `85000.0` → `85,000.00`.
pub fn format_salary(salary: f64) -> String {
    let fixed = format!("{:.2}", salary.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if salary < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{client, Scripted, ScriptedGenerator};

    const JOB_JSON: &str = r#"{
        "description": "  Join our physics department as a tenure-track professor.  ",
        "responsibilities": ["Teach undergraduate mechanics", "Supervise graduate research", "Teach undergraduate mechanics", " "],
        "required_skills": ["Quantum mechanics", "Grant writing", "Mentoring"],
        "qualifications": ["PhD in Physics", "Postdoctoral experience", "Publication record"]
    }"#;

    #[tokio::test(start_paused = true)]
    async fn test_generates_and_cleans_json_details() {
        let backend = ScriptedGenerator::texts(vec![JOB_JSON]);
        let generator = JobPostingGenerator::new(client(backend.clone()));

        let details = generator
            .generate_job_details("Professor of Physics", 120000.0)
            .await
            .unwrap();

        assert!(!details.is_failure());
        assert_eq!(
            details.description,
            "Join our physics department as a tenure-track professor."
        );
        assert_eq!(
            details.responsibilities,
            vec!["Teach undergraduate mechanics", "Supervise graduate research"]
        );
        assert_eq!(details.required_skills.len(), 3);
        assert_eq!(backend.configs(), vec![GenerationConfig::job_posting()]);
        assert!(backend.prompts()[0].contains("Title: Professor of Physics"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_title_is_rejected_without_calls() {
        let backend = ScriptedGenerator::texts(vec![JOB_JSON]);
        let generator = JobPostingGenerator::new(client(backend.clone()));

        let err = generator.generate_job_details("  ", 50000.0).await.unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyOrInvalidInput));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_field_degrades_to_error_details() {
        let backend = ScriptedGenerator::texts(vec![
            r#"{"description": "A role", "responsibilities": ["Teach"], "required_skills": ["Research"]}"#,
        ]);
        let generator = JobPostingGenerator::new(client(backend));

        let details = generator.generate_job_details("Lecturer", 60000.0).await.unwrap();

        assert!(details.is_failure());
        assert!(details.error.as_deref().unwrap().contains("qualifications"));
        assert!(details.description.is_empty());
        assert!(details.responsibilities.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_degrade_to_error_details() {
        let backend =
            ScriptedGenerator::new(vec![Scripted::Quota, Scripted::Quota, Scripted::Quota]);
        let generator = JobPostingGenerator::new(client(backend.clone()));

        let details = generator.generate_job_details("Lecturer", 60000.0).await.unwrap();

        assert_eq!(backend.calls(), 3);
        assert!(details.is_failure());
        assert!(details.required_skills.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_plain_text_response_uses_sectioned_parser() {
        let backend = ScriptedGenerator::texts(vec![
            "Job Description:\nA research-focused chemistry role.\n\nResponsibilities:\n1. Teach organic chemistry\n2) Run a lab\n\nRequired Skills:\n- Spectroscopy\n* Lab safety\n\nQualifications:\n• PhD in Chemistry",
        ]);
        let generator = JobPostingGenerator::new(client(backend));

        let details = generator
            .generate_job_details("Assistant Professor of Chemistry", 90000.0)
            .await
            .unwrap();

        assert!(!details.is_failure());
        assert_eq!(details.description, "A research-focused chemistry role.");
        assert_eq!(details.responsibilities, vec!["Teach organic chemistry", "Run a lab"]);
        assert_eq!(details.required_skills, vec!["Spectroscopy", "Lab safety"]);
        assert_eq!(details.qualifications, vec!["PhD in Chemistry"]);
    }

    #[test]
    fn test_sectioned_parser_fills_missing_sections() {
        let details = parse_sectioned_text(
            "Responsibilities:\n- Teach\n- Teach\n",
            "Lecturer in History",
            85000.0,
        );
        assert_eq!(
            details.description,
            "We are seeking a qualified candidate for the position of Lecturer in History with a competitive salary of $85,000.00."
        );
        assert_eq!(details.responsibilities, vec!["Teach"]);
        assert_eq!(details.required_skills, vec![TO_BE_SPECIFIED]);
        assert_eq!(details.qualifications, vec![TO_BE_SPECIFIED]);
    }

    #[test]
    fn test_sectioned_parser_ignores_text_before_first_heading() {
        let details = parse_sectioned_text(
            "Here is the posting you asked for.\nSkills\n- Python",
            "Lecturer",
            1000.0,
        );
        assert_eq!(details.required_skills, vec!["Python"]);
        assert!(details.description.contains("Lecturer"));
    }

    #[test]
    fn test_non_array_list_field_is_rejected() {
        let value = serde_json::json!({
            "description": "A role",
            "responsibilities": "Teach",
            "required_skills": ["Research"],
            "qualifications": ["PhD"]
        });
        let err = details_from_value(&value).unwrap_err();
        assert!(err.to_string().contains("responsibilities"));
    }

    #[test]
    fn test_blank_only_list_is_rejected() {
        let value = serde_json::json!({
            "description": "A role",
            "responsibilities": ["Teach"],
            "required_skills": ["", "  "],
            "qualifications": ["PhD"]
        });
        assert!(details_from_value(&value).is_err());
    }

    #[test]
    fn test_format_salary_groups_thousands() {
        assert_eq!(format_salary(85000.0), "85,000.00");
        assert_eq!(format_salary(1234567.891), "1,234,567.89");
        assert_eq!(format_salary(999.5), "999.50");
        assert_eq!(format_salary(0.0), "0.00");
    }
}
