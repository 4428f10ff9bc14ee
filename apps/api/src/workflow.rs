//! End-to-end flows behind the HTTP surface: job creation and application screening.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::applications::store::{get_application, update_screening, ScreeningUpdate};
use crate::errors::AppError;
use crate::jobs::generator::JobPostingGenerator;
use crate::jobs::store::{create_job, get_job, NewJob};
use crate::models::application::ApplicationStatus;
use crate::models::job::{JobDetails, JobRow, DEFAULT_DEPARTMENT, DEFAULT_LOCATION};
use crate::models::resume::ParsedResume;
use crate::notifications::{notify_candidate, Mailer};
use crate::resume::parser::ResumeParser;
use crate::screening::fit_scoring::{calculate_fit_score, decide_status, FitScorer, FitScores};
use crate::state::AppState;

const NOTIFICATION_WARNING: &str = "Application processed but notification email failed";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub salary: f64,
    pub department: Option<String>,
    pub location: Option<String>,
}

/// Result of a screened application.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub application_id: Uuid,
    pub scores: FitScores,
    pub application_status: ApplicationStatus,
    pub parsed_resume: ParsedResume,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Outcome of parsing and scoring, before anything is persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Screening {
    /// The resume lacks sections scoring depends on.
    Incomplete {
        parsed_resume: ParsedResume,
        missing: Vec<&'static str>,
    },
    Decided {
        parsed_resume: ParsedResume,
        scores: FitScores,
        status: ApplicationStatus,
    },
}

/// Generates posting content and stores the job.
pub async fn process_job_creation(
    state: &AppState,
    request: &CreateJobRequest,
) -> Result<JobRow, AppError> {
    let details = generate_posting(&state.job_generator, &request.title, request.salary).await?;

    let job = create_job(
        &state.db,
        &NewJob {
            title: request.title.trim().to_string(),
            salary: request.salary,
            department: non_blank_or(&request.department, DEFAULT_DEPARTMENT),
            location: non_blank_or(&request.location, DEFAULT_LOCATION),
            details,
        },
    )
    .await?;

    info!("Created job {} ('{}')", job.id, job.title);
    Ok(job)
}

/// Validates the salary and runs the generator, turning a degraded result into an error.
pub async fn generate_posting(
    generator: &JobPostingGenerator,
    title: &str,
    salary: f64,
) -> Result<JobDetails, AppError> {
    if !salary.is_finite() || salary < 0.0 {
        return Err(AppError::Validation(
            "Salary must be a non-negative number".to_string(),
        ));
    }

    let details = generator.generate_job_details(title, salary).await?;
    if details.is_failure() {
        return Err(AppError::Llm(details.error.unwrap_or_default()));
    }
    Ok(details)
}

fn non_blank_or(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Parses the resume and, when it has every required section, scores it.
pub async fn screen_resume(
    parser: &ResumeParser,
    scorer: &dyn FitScorer,
    threshold: f64,
    job: &JobDetails,
    resume_text: &str,
) -> Result<Screening, AppError> {
    let parsed_resume = parser.parse_resume(resume_text).await?;

    let missing = parsed_resume.missing_required_sections();
    if !missing.is_empty() {
        return Ok(Screening::Incomplete {
            parsed_resume,
            missing,
        });
    }

    let scores = calculate_fit_score(scorer, &parsed_resume, job).await;
    let status = decide_status(&scores, threshold);
    Ok(Screening::Decided {
        parsed_resume,
        scores,
        status,
    })
}

/// Screens a stored application and records the outcome.
///
/// An incomplete resume leaves the application `pending` with its parsed data
/// stored and is reported as an error. A failed notification becomes a warning.
pub async fn process_application_submission(
    state: &AppState,
    application_id: Uuid,
    resume_text: &str,
    job_id: Uuid,
) -> Result<SubmissionOutcome, AppError> {
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Resume text is empty or invalid".to_string(),
        ));
    }

    let job = get_job(&state.db, job_id).await?;
    let application = get_application(&state.db, application_id).await?;

    let screening = screen_resume(
        &state.resume_parser,
        state.fit_scorer.as_ref(),
        state.config.fit_score_threshold,
        &job.details(),
        resume_text,
    )
    .await?;

    let (parsed_resume, scores, status) = match screening {
        Screening::Incomplete {
            parsed_resume,
            missing,
        } => {
            update_screening(
                &state.db,
                application_id,
                &ScreeningUpdate {
                    status: ApplicationStatus::Pending,
                    fit_score: None,
                    parsed_scores: None,
                    parsed_resume: to_json(&parsed_resume)?,
                },
            )
            .await?;
            return Err(AppError::UnprocessableEntity(format!(
                "Resume parsing incomplete. Missing sections: {}",
                missing.join(", ")
            )));
        }
        Screening::Decided {
            parsed_resume,
            scores,
            status,
        } => (parsed_resume, scores, status),
    };

    update_screening(
        &state.db,
        application_id,
        &ScreeningUpdate {
            status,
            fit_score: Some(scores.overall_fit_score),
            parsed_scores: Some(to_json(&scores)?),
            parsed_resume: to_json(&parsed_resume)?,
        },
    )
    .await?;

    info!(
        "Application {application_id} for job {job_id}: {status} (overall {:.1})",
        scores.overall_fit_score
    );

    let warning = send_notification(
        state.mailer.as_ref(),
        &application.email,
        &application.full_name,
        &job.title,
        status,
    )
    .await;

    Ok(SubmissionOutcome {
        application_id,
        scores,
        application_status: status,
        parsed_resume,
        warning,
    })
}

/// Sends the decision email; a failure is returned as a warning message.
pub async fn send_notification(
    mailer: &dyn Mailer,
    recipient: &str,
    candidate_name: &str,
    job_title: &str,
    status: ApplicationStatus,
) -> Option<String> {
    match notify_candidate(mailer, recipient, candidate_name, job_title, status).await {
        Ok(()) => None,
        Err(e) => {
            warn!("Failed to send notification email: {e}");
            Some(NOTIFICATION_WARNING.to_string())
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}
