use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::applications::store::{create_application, get_application, list_by_job, NewApplication};
use crate::applications::uploads::{store_resume, ResumeUpload, UploadError};
use crate::auth::AdminGuard;
use crate::errors::AppError;
use crate::jobs::store::get_job;
use crate::models::application::ApplicationRow;
use crate::state::AppState;
use crate::workflow::{process_application_submission, SubmissionOutcome};

pub const MIN_AGE: i32 = 18;
pub const MAX_AGE: i32 = 100;

/// Multipart fields of a candidate submission.
#[derive(Debug)]
pub struct SubmissionForm {
    pub full_name: String,
    pub email: String,
    pub age: i32,
    pub gender: String,
    pub resume: ResumeUpload,
}

#[derive(Default)]
struct FormFields {
    full_name: Option<String>,
    email: Option<String>,
    age: Option<String>,
    gender: Option<String>,
    resume: Option<ResumeUpload>,
}

async fn read_submission(mut multipart: Multipart) -> Result<SubmissionForm, AppError> {
    let mut fields = FormFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "resume" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Invalid resume file: {e}")))?;
            fields.resume = Some(ResumeUpload::new(&filename, bytes)?);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid field '{name}': {e}")))?;
        match name.as_str() {
            "full_name" => fields.full_name = Some(value),
            "email" => fields.email = Some(value),
            "age" => fields.age = Some(value),
            "gender" => fields.gender = Some(value),
            _ => {}
        }
    }

    let resume = fields.resume.ok_or(UploadError::Missing)?;
    let full_name = required(fields.full_name, "full_name")?;
    let email = required(fields.email, "email")?;
    let gender = required(fields.gender, "gender")?;
    let age = required(fields.age, "age")?
        .parse::<i32>()
        .map_err(|_| AppError::Validation("Age must be a whole number".to_string()))?;

    validate_contact(&email, age)?;

    Ok(SubmissionForm {
        full_name,
        email,
        age,
        gender,
        resume,
    })
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing required field: {name}")))
}

fn validate_contact(email: &str, age: i32) -> Result<(), AppError> {
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(AppError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(AppError::Validation(format!(
            "Age must be between {MIN_AGE} and {MAX_AGE}"
        )));
    }
    Ok(())
}

/// Extracts the resume text off the async executor. Blank text is rejected.
async fn extract_resume_text(upload: ResumeUpload) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || upload.extract_text())
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("text extraction task failed: {e}")))??;

    if text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No text could be extracted from the resume".to_string(),
        ));
    }
    Ok(text)
}

/// POST /api/v1/jobs/:id/applications
///
/// Extracts the resume text first so an unreadable file persists nothing, then
/// stores the resume, records a pending application and screens it.
pub async fn handle_submit_application(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionOutcome>), AppError> {
    let form = read_submission(multipart).await?;

    let job = get_job(&state.db, job_id).await?;
    if !job.is_active {
        return Err(AppError::Validation(format!(
            "Job {job_id} is no longer accepting applications"
        )));
    }

    let resume_text = extract_resume_text(form.resume.clone()).await?;

    let application_id = Uuid::new_v4();
    let resume_key = form.resume.object_key(application_id);
    store_resume(&state.s3, &state.config.s3_bucket, &resume_key, &form.resume).await?;

    create_application(
        &state.db,
        &NewApplication {
            id: application_id,
            job_id,
            full_name: form.full_name,
            email: form.email,
            age: form.age,
            gender: form.gender,
            resume_key: Some(resume_key),
        },
    )
    .await?;
    info!("Application {application_id} received for job {job_id}");

    let outcome =
        process_application_submission(&state, application_id, &resume_text, job_id).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/v1/jobs/:id/applications
pub async fn handle_list_applications(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    get_job(&state.db, job_id).await?;
    Ok(Json(list_by_job(&state.db, job_id).await?))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    _admin: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    Ok(Json(get_application(&state.db, id).await?))
}
