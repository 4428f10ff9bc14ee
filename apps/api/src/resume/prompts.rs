// Resume extraction prompt templates.

/// Chunk extraction prompt. Replace `{part}`, `{total}` and `{chunk}` before sending.
pub const CHUNK_EXTRACTION_PROMPT: &str = r#"Analyze the following section (part {part} of {total}) of a resume and extract key information in JSON format:

Resume Section:
{chunk}

Return a JSON object with EXACTLY this structure. Include ONLY information that is explicitly present in the text:
{
    "education": [
        {
            "degree": "Full degree name",
            "institution": "Full institution name",
            "year": "Completion year or expected"
        }
    ],
    "skills": [
        "Individual technical or soft skills"
    ],
    "experience": [
        {
            "title": "Exact job title",
            "company": "Company name",
            "duration": "Employment period",
            "responsibilities": [
                "Key responsibilities or achievements"
            ]
        }
    ],
    "projects": [
        {
            "name": "Project name",
            "description": "Brief project description",
            "technologies": [
                "Technologies used"
            ]
        }
    ]
}

Important:
1. Only include information that appears in the text
2. Keep all text exactly as it appears (preserve case, spelling, etc.)
3. For missing sections, use empty arrays
4. Do not fabricate or infer missing details
"#;

pub fn build_chunk_prompt(chunk: &str, index: usize, total: usize) -> String {
    CHUNK_EXTRACTION_PROMPT
        .replace("{part}", &(index + 1).to_string())
        .replace("{total}", &total.to_string())
        .replace("{chunk}", chunk)
}
