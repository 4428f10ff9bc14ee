use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::jobs::generator::JobPostingGenerator;
use crate::notifications::Mailer;
use crate::resume::parser::ResumeParser;
use crate::screening::fit_scoring::FitScorer;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// The generator, parser and LLM fit scorer share one `LlmClient`, and with it
/// one rate limiter.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub config: Config,
    pub job_generator: JobPostingGenerator,
    pub resume_parser: ResumeParser,
    /// Pluggable fit scorer. Default: LlmFitScorer. Swap via FIT_SCORER env.
    pub fit_scorer: Arc<dyn FitScorer>,
    pub mailer: Arc<dyn Mailer>,
}
