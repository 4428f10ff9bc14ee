use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus};

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub id: Uuid,
    pub job_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub age: i32,
    pub gender: String,
    pub resume_key: Option<String>,
}

/// Screening outcome written back to an application.
#[derive(Debug, Clone)]
pub struct ScreeningUpdate {
    pub status: ApplicationStatus,
    pub fit_score: Option<f64>,
    pub parsed_scores: Option<Value>,
    pub parsed_resume: Value,
}

/// Inserts an application in `pending` status.
pub async fn create_application(
    pool: &PgPool,
    application: &NewApplication,
) -> Result<ApplicationRow, AppError> {
    Ok(sqlx::query_as::<_, ApplicationRow>(
        r#"
        INSERT INTO applications
            (id, job_id, full_name, email, age, gender, resume_key, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(application.id)
    .bind(application.job_id)
    .bind(&application.full_name)
    .bind(&application.email)
    .bind(application.age)
    .bind(&application.gender)
    .bind(&application.resume_key)
    .bind(ApplicationStatus::Pending.as_str())
    .fetch_one(pool)
    .await?)
}

pub async fn get_application(pool: &PgPool, id: Uuid) -> Result<ApplicationRow, AppError> {
    sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
}

/// Applications for one job, best fit first; unscored ones last.
pub async fn list_by_job(pool: &PgPool, job_id: Uuid) -> Result<Vec<ApplicationRow>, AppError> {
    Ok(sqlx::query_as::<_, ApplicationRow>(
        r#"
        SELECT * FROM applications
        WHERE job_id = $1
        ORDER BY fit_score DESC NULLS LAST, applied_at ASC
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?)
}

pub async fn update_screening(
    pool: &PgPool,
    id: Uuid,
    update: &ScreeningUpdate,
) -> Result<ApplicationRow, AppError> {
    sqlx::query_as::<_, ApplicationRow>(
        r#"
        UPDATE applications SET
            status        = $2,
            fit_score     = $3,
            parsed_scores = $4,
            parsed_resume = $5,
            updated_at    = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(update.status.as_str())
    .bind(update.fit_score)
    .bind(&update.parsed_scores)
    .bind(&update.parsed_resume)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
}
