use serde::{Deserialize, Serialize};

use super::domain::ApplicationStatus;
use super::validation::{looks_like_email, ValidationErrors};

/// Request to tell an applicant where their application stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNotice {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub fname: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Fully rendered plain-text status e-mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEmail {
    pub to: String,
    pub recipient_name: String,
    pub course: String,
    pub status: ApplicationStatus,
    pub subject: String,
    pub body: String,
}

impl StatusEmail {
    /// Validate the notice and render the template for its status.
    pub fn compose(notice: StatusNotice, signature: &str) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();

        let to = present(notice.email);
        match to.as_deref() {
            None => errors.push("Email is required.".to_string()),
            Some(address) if !looks_like_email(address) => {
                errors.push("Email must be a valid address.".to_string())
            }
            Some(_) => {}
        }
        let recipient_name = present(notice.fname);
        if recipient_name.is_none() {
            errors.push("First name is required.".to_string());
        }
        let course = present(notice.course);
        if course.is_none() {
            errors.push("Course is required.".to_string());
        }
        let status = match present(notice.status) {
            None => {
                errors.push("Status is required.".to_string());
                None
            }
            Some(raw) => {
                let parsed = ApplicationStatus::parse(&raw);
                if parsed.is_none() {
                    errors.push(
                        r#"Invalid status. Status must be either "rejected" or "selected" or "pending"."#
                            .to_string(),
                    );
                }
                parsed
            }
        };

        match (to, recipient_name, course, status) {
            (Some(to), Some(recipient_name), Some(course), Some(status)) if errors.is_empty() => {
                let (subject, body) = render(status, &recipient_name, &course, signature);
                Ok(Self {
                    to,
                    recipient_name,
                    course,
                    status,
                    subject: subject.to_string(),
                    body,
                })
            }
            _ => Err(ValidationErrors { messages: errors }),
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn render(
    status: ApplicationStatus,
    name: &str,
    course: &str,
    signature: &str,
) -> (&'static str, String) {
    match status {
        ApplicationStatus::Selected => (
            "Congratulations! Your Application Status",
            format!(
                "Hi {name},\n\n\
                 We are pleased to let you know that your application for the {course} position was successful.\n\n\
                 We are excited to have you on board. Further instructions about next steps will follow.\n\n\
                 Best regards,\n{signature}\n"
            ),
        ),
        ApplicationStatus::Rejected => (
            "Application Status Update",
            format!(
                "Hi {name},\n\n\
                 We regret to inform you that your application for the {course} position was not selected and will not move forward.\n\n\
                 Thank you for your interest and for the time you put into your application. We encourage you to apply for future openings.\n\n\
                 Best regards,\n{signature}\n"
            ),
        ),
        ApplicationStatus::Pending => (
            "Your Application Status Update",
            format!(
                "Hi {name},\n\n\
                 Your application for the {course} position is currently under review.\n\n\
                 We will let you know as soon as your status changes. Thank you for your patience.\n\n\
                 Best regards,\n{signature}\n"
            ),
        ),
    }
}

/// Outbound e-mail hook.
pub trait StatusMailer: Send + Sync {
    fn deliver(&self, email: &StatusEmail) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid mail address {address}: {reason}")]
    Address { address: String, reason: String },
    #[error("unable to build message: {0}")]
    Message(String),
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}
