//! Folding chunk extractions into one resume.
//!
//! Overlapping chunks re-extract the same facts with small rewordings, so a
//! candidate item is dropped when its normalized text is within
//! `DUPLICATE_SIMILARITY` of an item already kept in the same section.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::models::resume::{
    EducationEntry, ExperienceEntry, ParsedResume, ProjectEntry, GENERAL_SKILLS,
};
use crate::resume::extraction::ChunkResult;

/// Similarity at or above which two items count as the same item.
pub const DUPLICATE_SIMILARITY: f64 = 0.8;

/// Below this many skills, the document text is scanned for common keywords.
pub const MIN_SKILLS: usize = 3;

/// Fallback vocabulary matched against the document's lowercase words.
pub const COMMON_SKILL_KEYWORDS: &[&str] = &[
    "python",
    "java",
    "javascript",
    "c++",
    "sql",
    "management",
    "leadership",
    "communication",
    "analysis",
    "research",
    "development",
    "programming",
    "design",
    "testing",
    "project",
    "team",
    "agile",
    "database",
    "web",
];

/// Character-level similarity ratio in `[0, 1]`, case-insensitive.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Canonical text used for near-duplicate comparison.
pub trait NormalizedForm {
    fn normalized_form(&self) -> String;
}

impl NormalizedForm for String {
    fn normalized_form(&self) -> String {
        self.clone()
    }
}

fn canonical_json<T: Serialize>(item: &T) -> String {
    serde_json::to_string(item).unwrap_or_default()
}

impl NormalizedForm for EducationEntry {
    fn normalized_form(&self) -> String {
        canonical_json(self)
    }
}

impl NormalizedForm for ExperienceEntry {
    fn normalized_form(&self) -> String {
        canonical_json(self)
    }
}

impl NormalizedForm for ProjectEntry {
    fn normalized_form(&self) -> String {
        canonical_json(self)
    }
}

/// Appends each incoming item unless it is a near-duplicate of one already kept.
pub fn merge_items<T: NormalizedForm>(existing: &mut Vec<T>, incoming: Vec<T>) {
    for candidate in incoming {
        let form = candidate.normalized_form();
        let duplicate = existing
            .iter()
            .any(|kept| similarity(&form, &kept.normalized_form()) >= DUPLICATE_SIMILARITY);
        if !duplicate {
            existing.push(candidate);
        }
    }
}

/// Running merge of chunk extractions for one parse request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionAccumulator {
    pub education: Vec<EducationEntry>,
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub projects: Vec<ProjectEntry>,
}

impl ExtractionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, chunk: ChunkResult) {
        merge_items(&mut self.education, chunk.education);
        merge_items(&mut self.skills, chunk.skills);
        merge_items(&mut self.experience, chunk.experience);
        merge_items(&mut self.projects, chunk.projects);
    }

    pub fn item_count(&self) -> usize {
        self.education.len() + self.skills.len() + self.experience.len() + self.projects.len()
    }

    /// Produces the final resume.
    ///
    /// Skills are exact-deduplicated and sorted; experience without
    /// responsibilities and projects without technologies are dropped; sparse
    /// skills are topped up from `document`; every empty section gets one
    /// "Not Specified" placeholder.
    pub fn finalize(self, document: &str) -> ParsedResume {
        let mut skills: Vec<String> = self
            .skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let experience: Vec<ExperienceEntry> = self
            .experience
            .into_iter()
            .map(|mut e| {
                e.responsibilities.retain(|r| !r.trim().is_empty());
                e
            })
            .filter(|e| !e.responsibilities.is_empty())
            .collect();

        let projects: Vec<ProjectEntry> = self
            .projects
            .into_iter()
            .map(|mut p| {
                p.technologies.retain(|t| !t.trim().is_empty());
                p
            })
            .filter(|p| !p.technologies.is_empty())
            .collect();

        if skills.len() < MIN_SKILLS {
            for keyword in keyword_skills(document) {
                if !skills.iter().any(|s| s.eq_ignore_ascii_case(&keyword)) {
                    skills.push(keyword);
                }
            }
        }

        let mut resume = ParsedResume {
            education: self.education,
            skills,
            experience,
            projects,
            parsing_error: None,
        };
        fill_placeholders(&mut resume);
        resume
    }
}

/// Common skill keywords present as whole words in `document`, alphabetically.
pub fn keyword_skills(document: &str) -> Vec<String> {
    let lowered = document.to_lowercase();
    let words: HashSet<&str> = lowered.split_whitespace().collect();
    COMMON_SKILL_KEYWORDS
        .iter()
        .filter(|k| words.contains(**k))
        .map(|k| k.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn fill_placeholders(resume: &mut ParsedResume) {
    if resume.education.is_empty() {
        resume.education.push(EducationEntry::placeholder());
    }
    if resume.skills.is_empty() {
        resume.skills.push(GENERAL_SKILLS.to_string());
    }
    if resume.experience.is_empty() {
        resume.experience.push(ExperienceEntry::placeholder());
    }
    if resume.projects.is_empty() {
        resume.projects.push(ProjectEntry::placeholder());
    }
}
