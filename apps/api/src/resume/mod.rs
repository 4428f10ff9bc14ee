// Resume extraction: preprocess → chunk → per-chunk extraction → merge → finalize.
// All LLM calls go through llm_client; the envelope owns throttling and retries.

pub mod chunking;
pub mod extraction;
pub mod merge;
pub mod parser;
pub mod preprocess;
pub mod prompts;
