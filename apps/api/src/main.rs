mod applications;
mod auth;
mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod notifications;
mod resume;
mod routes;
mod screening;
mod state;
mod workflow;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, FitScorerKind};
use crate::db::create_pool;
use crate::jobs::generator::JobPostingGenerator;
use crate::llm_client::gemini::GeminiClient;
use crate::llm_client::{LlmClient, RateLimiter};
use crate::notifications::LogMailer;
use crate::resume::parser::ResumeParser;
use crate::routes::build_router;
use crate::screening::fit_scoring::{FitScorer, KeywordFitScorer, LlmFitScorer};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SmartHire API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize LLM client: one backend, one shared rate window
    let backend = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())?;
    info!("Gemini model: {}", backend.model());
    let limiter = RateLimiter::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    );
    info!(
        "Rate limit: {} requests per {:?}",
        limiter.max_requests(),
        limiter.window()
    );
    let llm = LlmClient::new(Arc::new(backend), Arc::new(limiter));
    info!("LLM client initialized (backend: {})", llm.backend_name());

    let fit_scorer: Arc<dyn FitScorer> = match config.fit_scorer {
        FitScorerKind::Llm => Arc::new(LlmFitScorer(llm.clone())),
        FitScorerKind::Keyword => Arc::new(KeywordFitScorer),
    };
    info!("Fit scorer: {}", fit_scorer.backend());

    if config.mail_sender.is_none() {
        info!("MAIL_SENDER not set; candidate notifications will be reported as warnings");
    }

    // Build app state
    let state = AppState {
        db,
        s3,
        job_generator: JobPostingGenerator::new(llm.clone()),
        resume_parser: ResumeParser::new(llm).with_chunking(config.resume_chunking),
        fit_scorer,
        mailer: Arc::new(LogMailer::new(config.mail_sender.clone())),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "smarthire-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
