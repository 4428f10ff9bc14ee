use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AdminGuard;
use crate::errors::AppError;
use crate::jobs::store::{get_job, list_jobs, soft_delete_job, update_job, JobUpdate};
use crate::models::job::JobRow;
use crate::state::AppState;
use crate::workflow::{process_job_creation, CreateJobRequest};

#[derive(Deserialize)]
pub struct ListJobsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    let job = process_job_creation(&state, &req).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListJobsQuery>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    Ok(Json(list_jobs(&state.db, params.include_inactive).await?))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    Ok(Json(get_job(&state.db, id).await?))
}

/// PATCH /api/v1/jobs/:id
pub async fn handle_update_job(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<JobUpdate>,
) -> Result<Json<JobRow>, AppError> {
    if update.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }
    if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("Title cannot be blank".to_string()));
    }
    if update.salary.is_some_and(|s| !s.is_finite() || s < 0.0) {
        return Err(AppError::Validation(
            "Salary must be a non-negative number".to_string(),
        ));
    }
    Ok(Json(update_job(&state.db, id, &update).await?))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    soft_delete_job(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
