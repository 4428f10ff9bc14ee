//! Candidate notifications.
//!
//! Messages are rendered from fixed templates and handed to a `Mailer`. The
//! shipped `LogMailer` records the rendered message instead of delivering it.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::models::application::ApplicationStatus;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email configuration missing: no sender address")]
    NotConfigured,

    #[error("No email template for status '{0}'")]
    NoTemplate(ApplicationStatus),

    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    Selected,
    Rejected,
}

const SELECTED_SUBJECT: &str = "Interview Shortlist - Faculty Position";
const SELECTED_BODY: &str = "Dear {candidate_name},

Congratulations! We are pleased to inform you that you have been shortlisted for an interview for the {job_title} position.

We will contact you shortly with further details about the interview process.

Best regards,
SmartHire AI Team";

const REJECTED_SUBJECT: &str = "Application Status Update - Faculty Position";
const REJECTED_BODY: &str = "Dear {candidate_name},

Thank you for your interest in the {job_title} position and for taking the time to apply.

After careful consideration, we regret to inform you that we will not be moving forward with your application at this time.

We wish you the best in your future endeavors.

Best regards,
SmartHire AI Team";

impl EmailTemplate {
    /// Template for a decided application; `Pending` has none.
    pub fn for_status(status: ApplicationStatus) -> Result<Self, MailError> {
        match status {
            ApplicationStatus::Selected => Ok(EmailTemplate::Selected),
            ApplicationStatus::Rejected => Ok(EmailTemplate::Rejected),
            ApplicationStatus::Pending => Err(MailError::NoTemplate(status)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::Selected => "selected",
            EmailTemplate::Rejected => "rejected",
        }
    }

    fn parts(&self) -> (&'static str, &'static str) {
        match self {
            EmailTemplate::Selected => (SELECTED_SUBJECT, SELECTED_BODY),
            EmailTemplate::Rejected => (REJECTED_SUBJECT, REJECTED_BODY),
        }
    }

    pub fn render(&self, candidate_name: &str, job_title: &str) -> EmailMessage {
        let (subject, body) = self.parts();
        let fill = |text: &str| {
            text.replace("{candidate_name}", candidate_name)
                .replace("{job_title}", job_title)
        };
        EmailMessage {
            template: *self,
            subject: fill(subject),
            body: fill(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub template: EmailTemplate,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, message: &EmailMessage) -> Result<(), MailError>;
}

/// Records messages through `tracing`. Refuses to send without a sender address
/// or to a recipient that is not a mailbox.
pub struct LogMailer {
    sender: Option<String>,
}

impl LogMailer {
    pub fn new(sender: Option<String>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, recipient: &str, message: &EmailMessage) -> Result<(), MailError> {
        let sender = self.sender.as_deref().ok_or(MailError::NotConfigured)?;
        let deliverable = recipient
            .split_once('@')
            .is_some_and(|(local, domain)| !local.trim().is_empty() && !domain.trim().is_empty());
        if !deliverable {
            return Err(MailError::Delivery(format!(
                "invalid recipient address '{recipient}'"
            )));
        }
        info!(
            from = sender,
            to = recipient,
            template = message.template.name(),
            "Email queued: {}",
            message.subject
        );
        Ok(())
    }
}

/// Renders and sends the notification for a decided application.
pub async fn notify_candidate(
    mailer: &dyn Mailer,
    recipient: &str,
    candidate_name: &str,
    job_title: &str,
    status: ApplicationStatus,
) -> Result<(), MailError> {
    let template = EmailTemplate::for_status(status)?;
    let message = template.render(candidate_name, job_title);
    mailer.send(recipient, &message).await?;
    info!("Email sent successfully to {recipient}");
    Ok(())
}
