// Fit scoring prompt templates.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

/// Replace `{job_details}` and `{candidate_profile}` before sending.
pub const FIT_SCORE_PROMPT: &str = r#"Analyze this candidate's profile against the job requirements and provide a precise scoring breakdown.

Job Requirements:
{job_details}

Candidate Profile:
{candidate_profile}

Scoring Guidelines:

1. Skills Assessment (40% of total):
   - Exact skills matches: Award 3 points each
   - Related/transferable skills: Award 1-2 points based on relevance
   - Domain-specific skills alignment: 0-20 bonus points
   - Normalize to 100 point scale

2. Experience Evaluation (40% of total):
   - Years in similar roles: 0-40 points
   - Industry relevance: 0-30 points
   - Role responsibility matches: 0-30 points

3. Education Score (20% of total):
   - Degree level match: 0-40 points
   - Field relevance: 0-40 points
   - Institution ranking/reputation: 0-20 points

Calculate each component score (0-100) and return:
{
    "skill_match_score": float,
    "experience_relevance_score": float,
    "education_alignment_score": float,
    "overall_fit_score": float,
    "reasoning": "Detailed scoring breakdown and justification"
}

The overall_fit_score is the weighted average of the three component scores.

Important Rules:
- Score conservatively - require clear evidence
- Use exact 0-100 scale for each component
- Show detailed math in reasoning
- Lower scores for missing/unclear info
- Consider quality and depth, not just presence
"#;

pub fn build_fit_score_prompt(job_details: &str, candidate_profile: &str) -> String {
    let mut prompt = FIT_SCORE_PROMPT
        .replace("{job_details}", job_details)
        .replace("{candidate_profile}", candidate_profile);
    prompt.push('\n');
    prompt.push_str(JSON_ONLY_INSTRUCTION);
    prompt
}
