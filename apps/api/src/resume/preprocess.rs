//! Resume text normalization applied before chunking.

use std::sync::LazyLock;

use regex::Regex;

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("blank lines regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static BULLETS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\u{2022}\u{2023}\u{2043}\u{204C}\u{204D}\u{2219}\u{25D8}\u{25E6}\u{2619}]")
        .expect("bullet regex")
});
static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(technical skills|professional summary|work history|certifications|achievements|employment|experience|education|objective|projects|skills)\b",
    )
    .expect("section header regex")
});
static LINE_EDGE_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*\n[ \t]*").expect("line edge regex"));

/// Cleans raw resume text for extraction.
///
/// Collapses whitespace, maps bullet glyphs to `-`, straightens quotes and
/// starts a new line at every common section header so chunk prompts keep
/// section context.
pub fn preprocess_resume_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let text = BLANK_LINES.replace_all(text, "\n");
    let text = WHITESPACE_RUN.replace_all(&text, " ");
    let text = BULLETS.replace_all(&text, "-");
    let text = text
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    let text = SECTION_HEADER.replace_all(&text, "\n$1");
    let text = LINE_EDGE_SPACES.replace_all(&text, "\n");
    let text = BLANK_LINES.replace_all(&text, "\n");

    text.trim().to_string()
}
