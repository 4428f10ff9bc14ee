use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobDetails, JobRow};

/// Fields for a new posting.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub salary: f64,
    pub department: String,
    pub location: String,
    pub details: JobDetails,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub salary: Option<f64>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub responsibilities: Option<Vec<String>>,
    pub required_skills: Option<Vec<String>>,
    pub qualifications: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl JobUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.salary.is_none()
            && self.department.is_none()
            && self.location.is_none()
            && self.description.is_none()
            && self.responsibilities.is_none()
            && self.required_skills.is_none()
            && self.qualifications.is_none()
            && self.is_active.is_none()
    }
}

pub async fn create_job(pool: &PgPool, job: &NewJob) -> Result<JobRow, AppError> {
    Ok(sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs
            (id, title, salary, department, location, description,
             responsibilities, required_skills, qualifications)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&job.title)
    .bind(job.salary)
    .bind(&job.department)
    .bind(&job.location)
    .bind(&job.details.description)
    .bind(&job.details.responsibilities)
    .bind(&job.details.required_skills)
    .bind(&job.details.qualifications)
    .fetch_one(pool)
    .await?)
}

pub async fn get_job(pool: &PgPool, id: Uuid) -> Result<JobRow, AppError> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

/// Newest first. Soft-deleted postings are included only on request.
pub async fn list_jobs(pool: &PgPool, include_inactive: bool) -> Result<Vec<JobRow>, AppError> {
    Ok(sqlx::query_as::<_, JobRow>(
        "SELECT * FROM jobs WHERE is_active OR $1 ORDER BY created_at DESC",
    )
    .bind(include_inactive)
    .fetch_all(pool)
    .await?)
}

pub async fn update_job(pool: &PgPool, id: Uuid, update: &JobUpdate) -> Result<JobRow, AppError> {
    sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs SET
            title            = COALESCE($2, title),
            salary           = COALESCE($3, salary),
            department       = COALESCE($4, department),
            location         = COALESCE($5, location),
            description      = COALESCE($6, description),
            responsibilities = COALESCE($7, responsibilities),
            required_skills  = COALESCE($8, required_skills),
            qualifications   = COALESCE($9, qualifications),
            is_active        = COALESCE($10, is_active),
            updated_at       = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&update.title)
    .bind(update.salary)
    .bind(&update.department)
    .bind(&update.location)
    .bind(&update.description)
    .bind(&update.responsibilities)
    .bind(&update.required_skills)
    .bind(&update.qualifications)
    .bind(update.is_active)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

/// Marks a posting inactive; the row and its applications are kept.
pub async fn soft_delete_job(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE jobs SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Job {id} not found")));
    }
    Ok(())
}
