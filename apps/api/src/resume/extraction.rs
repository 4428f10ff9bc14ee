//! Validation and cleaning of one chunk's extraction.
//!
//! The model's JSON is treated as untrusted: sections may be missing or of the
//! wrong type, scalars may be numbers, and entries may be blank. Cleaning keeps
//! only entries with an identifying field; a chunk with nothing left is rejected.

use serde_json::{Map, Value};

use crate::errors::ExtractionError;
use crate::models::resume::{EducationEntry, ExperienceEntry, ProjectEntry};

/// One chunk's validated extraction, in the four-section resume shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkResult {
    pub education: Vec<EducationEntry>,
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub projects: Vec<ProjectEntry>,
}

impl ChunkResult {
    /// Validates and cleans a parsed model response.
    pub fn from_value(value: &Value) -> Result<Self, ExtractionError> {
        let object = value.as_object().ok_or_else(|| {
            ExtractionError::MalformedResponse("response is not a JSON object".to_string())
        })?;

        let result = Self {
            education: section(object, "education")
                .filter_map(clean_education)
                .collect(),
            skills: section(object, "skills").filter_map(scalar_text).collect(),
            experience: section(object, "experience")
                .filter_map(clean_experience)
                .collect(),
            projects: section(object, "projects").filter_map(clean_project).collect(),
        };

        if result.item_count() == 0 {
            return Err(ExtractionError::MalformedResponse(
                "no valid items found in any section".to_string(),
            ));
        }

        Ok(result)
    }

    pub fn item_count(&self) -> usize {
        self.education.len() + self.skills.len() + self.experience.len() + self.projects.len()
    }
}

/// Items of a section; missing or non-array sections are empty.
fn section<'a>(object: &'a Map<String, Value>, key: &str) -> impl Iterator<Item = &'a Value> {
    object
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Trimmed text of a string or number; `None` for anything else or blank text.
fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn field(entry: &Map<String, Value>, key: &str) -> String {
    entry.get(key).and_then(scalar_text).unwrap_or_default()
}

fn string_list(entry: &Map<String, Value>, key: &str) -> Vec<String> {
    entry
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(scalar_text).collect())
        .unwrap_or_default()
}

fn clean_education(value: &Value) -> Option<EducationEntry> {
    let entry = value.as_object()?;
    let cleaned = EducationEntry {
        degree: field(entry, "degree"),
        institution: field(entry, "institution"),
        year: field(entry, "year"),
    };
    (!cleaned.degree.is_empty() || !cleaned.institution.is_empty()).then_some(cleaned)
}

fn clean_experience(value: &Value) -> Option<ExperienceEntry> {
    let entry = value.as_object()?;
    let cleaned = ExperienceEntry {
        title: field(entry, "title"),
        company: field(entry, "company"),
        duration: field(entry, "duration"),
        responsibilities: string_list(entry, "responsibilities"),
    };
    (!cleaned.title.is_empty() || !cleaned.company.is_empty()).then_some(cleaned)
}

fn clean_project(value: &Value) -> Option<ProjectEntry> {
    let entry = value.as_object()?;
    let cleaned = ProjectEntry {
        name: field(entry, "name"),
        description: field(entry, "description"),
        technologies: string_list(entry, "technologies"),
    };
    (!cleaned.name.is_empty() || !cleaned.description.is_empty()).then_some(cleaned)
}
