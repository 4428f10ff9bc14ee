use serde::{Deserialize, Serialize};

/// Placeholder for a field the resume did not provide.
pub const NOT_SPECIFIED: &str = "Not Specified";
/// Placeholder skill used when no skill could be extracted.
pub const GENERAL_SKILLS: &str = "General Skills";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    pub year: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub duration: String,
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
}

impl EducationEntry {
    pub fn placeholder() -> Self {
        Self {
            degree: NOT_SPECIFIED.to_string(),
            institution: NOT_SPECIFIED.to_string(),
            year: NOT_SPECIFIED.to_string(),
        }
    }
}

impl ExperienceEntry {
    pub fn placeholder() -> Self {
        Self {
            title: NOT_SPECIFIED.to_string(),
            company: NOT_SPECIFIED.to_string(),
            duration: NOT_SPECIFIED.to_string(),
            responsibilities: vec![NOT_SPECIFIED.to_string()],
        }
    }
}

impl ProjectEntry {
    pub fn placeholder() -> Self {
        Self {
            name: NOT_SPECIFIED.to_string(),
            description: NOT_SPECIFIED.to_string(),
            technologies: vec![NOT_SPECIFIED.to_string()],
        }
    }
}

/// Structured resume handed to scoring and persisted with the application.
///
/// A parse that failed outright has all four lists empty and `parsing_error` set;
/// callers key off "skills and experience both empty" as the failure signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    pub education: Vec<EducationEntry>,
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub projects: Vec<ProjectEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsing_error: Option<String>,
}

impl ParsedResume {
    /// The degraded result for a parse that produced nothing usable.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            parsing_error: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn is_parsing_failure(&self) -> bool {
        self.skills.is_empty() && self.experience.is_empty()
    }

    /// Sections the screening workflow requires but this resume lacks.
    pub fn missing_required_sections(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.education.is_empty() {
            missing.push("education");
        }
        if self.skills.is_empty() {
            missing.push("skills");
        }
        if self.experience.is_empty() {
            missing.push("experience");
        }
        missing
    }
}
