//! Resume parser: turns free-text resumes into a `ParsedResume`.
//!
//! Flow: preprocess → chunk → per-chunk extraction at escalating temperatures →
//!       near-duplicate merge → finalize.
//!
//! A chunk that fails at every temperature is skipped; a parse where no chunk
//! succeeds degrades to `ParsedResume::failed` at the entry point.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::ExtractionError;
use crate::llm_client::{GenerationConfig, LlmClient};
use crate::models::resume::ParsedResume;
use crate::resume::chunking::{split_into_chunks, ChunkingConfig};
use crate::resume::extraction::ChunkResult;
use crate::resume::merge::ExtractionAccumulator;
use crate::resume::preprocess::preprocess_resume_text;
use crate::resume::prompts::build_chunk_prompt;

/// Sampling temperatures tried per chunk, most conservative first.
pub const EXTRACTION_TEMPERATURES: [f32; 3] = [0.3, 0.5, 0.7];

#[derive(Clone)]
pub struct ResumeParser {
    llm: LlmClient,
    chunking: ChunkingConfig,
}

impl ResumeParser {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            chunking: ChunkingConfig::default(),
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    /// Parses a resume. Blank input is rejected; every other failure becomes the
    /// empty structure with `parsing_error` set.
    pub async fn parse_resume(&self, resume_text: &str) -> Result<ParsedResume, ExtractionError> {
        if resume_text.trim().is_empty() {
            return Err(ExtractionError::EmptyOrInvalidInput);
        }

        info!("Starting resume parsing. Text length: {}", resume_text.len());

        match self.extract(resume_text).await {
            Ok(resume) => Ok(resume),
            Err(e) => {
                warn!("Resume parsing failed, returning empty structure: {e}");
                Ok(ParsedResume::failed(e.to_string()))
            }
        }
    }

    /// Runs the extraction stages and reports the first stage-level failure.
    pub async fn extract(&self, resume_text: &str) -> Result<ParsedResume, ExtractionError> {
        let text = preprocess_resume_text(resume_text);
        if text.is_empty() {
            return Err(ExtractionError::EmptyOrInvalidInput);
        }

        let chunks = split_into_chunks(&text, self.chunking);
        let total = chunks.len();
        info!("Preprocessed text length: {}, split into {total} chunks", text.len());

        let mut accumulator = ExtractionAccumulator::new();
        let mut parsed_chunks = 0;
        let mut last_error = None;

        for (index, chunk) in chunks.iter().enumerate() {
            match self.extract_chunk(chunk, index, total).await {
                Ok(result) => {
                    parsed_chunks += 1;
                    accumulator.merge(result);
                }
                Err(e) => {
                    warn!("Failed to parse chunk {}/{total}: {e}", index + 1);
                    last_error = Some(e.to_string());
                }
            }
        }

        if parsed_chunks == 0 {
            return Err(ExtractionError::NoUsableChunks {
                chunks: total,
                last_error: last_error.unwrap_or_default(),
            });
        }

        let resume = accumulator.finalize(&text);
        info!(
            "Resume parsed from {parsed_chunks}/{total} chunks: {} education, {} skills, {} experience, {} projects",
            resume.education.len(),
            resume.skills.len(),
            resume.experience.len(),
            resume.projects.len()
        );
        Ok(resume)
    }

    /// Extracts one chunk, escalating the temperature until a valid structure comes back.
    async fn extract_chunk(
        &self,
        chunk: &str,
        index: usize,
        total: usize,
    ) -> Result<ChunkResult, ExtractionError> {
        let prompt = build_chunk_prompt(chunk, index, total);
        let mut last_error =
            ExtractionError::MalformedResponse("no extraction attempted".to_string());

        for temperature in EXTRACTION_TEMPERATURES {
            debug!(
                "Processing chunk {}/{total} with temperature {temperature}",
                index + 1
            );
            match self.attempt_chunk(&prompt, temperature).await {
                Ok(result) => {
                    debug!("Parsed chunk {} with {} items", index + 1, result.item_count());
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        "Chunk {}/{total} attempt at temperature {temperature} failed: {e}",
                        index + 1
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn attempt_chunk(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<ChunkResult, ExtractionError> {
        let value: Value = self
            .llm
            .call_json(prompt, &GenerationConfig::resume_chunk(temperature))
            .await?;
        ChunkResult::from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{client, Scripted, ScriptedGenerator};
    use crate::models::resume::{EducationEntry, ProjectEntry, GENERAL_SKILLS};

    const CHUNK_JSON: &str = r#"{
        "education": [{"degree": "MSc Data Science", "institution": "ETH Zurich", "year": "2021"}],
        "skills": ["Python", "Spark", "Statistics"],
        "experience": [{
            "title": "Data Engineer",
            "company": "Globex",
            "duration": "2021-2024",
            "responsibilities": ["Built streaming pipelines"]
        }],
        "projects": [{"name": "Forecaster", "description": "Demand forecasting", "technologies": ["PyTorch"]}]
    }"#;

    fn small_chunks() -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: 40,
            chunk_overlap: 5,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_input_is_rejected_without_calls() {
        let backend = ScriptedGenerator::texts(Vec::<String>::new());
        let parser = ResumeParser::new(client(backend.clone()));

        let err = parser.parse_resume("   \n ").await.unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyOrInvalidInput));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_chunk_resume_is_parsed() {
        let backend = ScriptedGenerator::texts(vec![CHUNK_JSON]);
        let parser = ResumeParser::new(client(backend.clone()));

        let resume = parser
            .parse_resume("Data Engineer at Globex. MSc Data Science, ETH Zurich.")
            .await
            .unwrap();

        assert_eq!(backend.calls(), 1);
        assert_eq!(resume.skills, vec!["Python", "Spark", "Statistics"]);
        assert_eq!(resume.education[0].institution, "ETH Zurich");
        assert_eq!(resume.experience[0].company, "Globex");
        assert_eq!(resume.projects[0].name, "Forecaster");
        assert!(resume.parsing_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_chunk_escalates_temperature() {
        let backend = ScriptedGenerator::texts(vec![
            "I could not find anything.",
            r#"{"education": [], "skills": [], "experience": [], "projects": []}"#,
            CHUNK_JSON,
        ]);
        let parser = ResumeParser::new(client(backend.clone()));

        let resume = parser.parse_resume("Short resume text").await.unwrap();

        let temperatures: Vec<_> = backend.configs().iter().map(|c| c.temperature).collect();
        assert_eq!(temperatures, vec![Some(0.3), Some(0.5), Some(0.7)]);
        assert_eq!(resume.skills.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_attempt_failing_degrades_to_error_structure() {
        let text = "Senior engineer with broad experience in distributed systems and teams.";
        let chunk_count = split_into_chunks(&preprocess_resume_text(text), small_chunks()).len();
        assert!(chunk_count > 1);

        let backend = ScriptedGenerator::texts(vec!["not json"; chunk_count * 3]);
        let parser = ResumeParser::new(client(backend.clone())).with_chunking(small_chunks());

        let resume = parser.parse_resume(text).await.unwrap();

        assert_eq!(backend.calls(), chunk_count * 3);
        assert!(resume.education.is_empty());
        assert!(resume.skills.is_empty());
        assert!(resume.experience.is_empty());
        assert!(resume.projects.is_empty());
        assert!(resume.parsing_error.is_some());
        assert!(resume.is_parsing_failure());
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_bad_chunk_does_not_abort_the_parse() {
        let text = "Senior engineer with broad experience in distributed systems and teams.";
        let chunk_count = split_into_chunks(&preprocess_resume_text(text), small_chunks()).len();

        let mut responses = vec![Scripted::Fail(500), Scripted::Quota, Scripted::Text("[]".into())];
        for _ in 1..chunk_count {
            responses.push(Scripted::Text(r#"{"skills": ["Distributed Systems"]}"#.into()));
        }
        // The quota retry inside the envelope consumes one more scripted reply.
        responses.insert(2, Scripted::Text("still not an object".into()));
        let backend = ScriptedGenerator::new(responses);
        let parser = ResumeParser::new(client(backend)).with_chunking(small_chunks());

        let resume = parser.parse_resume(text).await.unwrap();

        assert!(resume.parsing_error.is_none());
        assert!(resume.skills.contains(&"Distributed Systems".to_string()));
        assert_eq!(resume.education, vec![EducationEntry::placeholder()]);
        assert_eq!(resume.projects, vec![ProjectEntry::placeholder()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_chunks_merge_duplicates() {
        let text = "Skills: Python, Spark and Statistics for data pipelines at Globex in Zurich.";
        let chunk_count = split_into_chunks(&preprocess_resume_text(text), small_chunks()).len();

        let backend = ScriptedGenerator::texts(vec![CHUNK_JSON; chunk_count]);
        let parser = ResumeParser::new(client(backend)).with_chunking(small_chunks());

        let resume = parser.parse_resume(text).await.unwrap();
        assert_eq!(resume.skills, vec!["Python", "Spark", "Statistics"]);
        assert_eq!(resume.experience.len(), 1);
        assert_eq!(resume.education.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunk_prompts_carry_part_numbers() {
        let text = "Senior engineer with broad experience in distributed systems and teams.";
        let chunk_count = split_into_chunks(&preprocess_resume_text(text), small_chunks()).len();

        let backend = ScriptedGenerator::texts(vec![r#"{"skills": ["Go"]}"#; chunk_count]);
        let parser = ResumeParser::new(client(backend.clone())).with_chunking(small_chunks());

        let resume = parser.parse_resume(text).await.unwrap();
        let prompts = backend.prompts();
        assert!(prompts[0].contains(&format!("(part 1 of {chunk_count})")));
        assert!(prompts[chunk_count - 1].contains(&format!("(part {chunk_count} of {chunk_count})")));
        assert_ne!(resume.skills, vec![GENERAL_SKILLS.to_string()]);
    }
}
