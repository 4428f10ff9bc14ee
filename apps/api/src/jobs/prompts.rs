// Job posting prompt templates.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

/// Replace `{title}` and `{salary}` before sending.
pub const JOB_DETAILS_PROMPT: &str = r#"Generate a detailed job description for a faculty position with the following details:
Title: {title}
Salary: ${salary}

Return a JSON object with EXACTLY this structure:
{
    "description": "A detailed paragraph describing the role and institution",
    "responsibilities": [
        "Responsibility 1",
        "Responsibility 2",
        "..."
    ],
    "required_skills": [
        "Skill 1",
        "Skill 2",
        "..."
    ],
    "qualifications": [
        "Qualification 1",
        "Qualification 2",
        "..."
    ]
}

Ensure all arrays have at least 3 items. Keep the description concise but informative.
"#;

pub fn build_job_details_prompt(title: &str, salary: f64) -> String {
    let mut prompt = JOB_DETAILS_PROMPT
        .replace("{title}", title)
        .replace("{salary}", &salary.to_string());
    prompt.push_str(JSON_ONLY_INSTRUCTION);
    prompt
}
