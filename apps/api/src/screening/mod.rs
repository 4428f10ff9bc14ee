pub mod fit_scoring;
pub mod prompts;
