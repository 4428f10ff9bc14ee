pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::applications::uploads::MAX_UPLOAD_SIZE;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

/// Multipart framing and the text fields on top of the file itself.
const SUBMISSION_BODY_LIMIT: usize = MAX_UPLOAD_SIZE + 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Job postings
        .route(
            "/api/v1/jobs",
            post(jobs::handle_create_job).get(jobs::handle_list_jobs),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .patch(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // Applications
        .route(
            "/api/v1/jobs/:id/applications",
            post(applications::handle_submit_application)
                .layer(DefaultBodyLimit::max(SUBMISSION_BODY_LIMIT))
                .get(applications::handle_list_applications),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handle_get_application),
        )
        .with_state(state)
}
