use chrono::NaiveDate;
use lettre::Address;

use super::domain::{Applicant, ApplicationForm, Resume, TeachingExperience};

const DEFAULT_MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
const WORD_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Every problem found on a submitted form, in field order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .messages.join(" "))]
pub struct ValidationErrors {
    pub messages: Vec<String>,
}

impl ValidationErrors {
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    pub fn contains(&self, message: &str) -> bool {
        self.messages.iter().any(|candidate| candidate == message)
    }
}

/// Policy dial for uploaded resumes.
#[derive(Debug, Clone)]
pub struct IntakePolicy {
    max_resume_bytes: usize,
    allowed_resume_types: Vec<mime::Mime>,
}

impl IntakePolicy {
    pub fn new(max_resume_bytes: usize) -> Self {
        let max_resume_bytes = if max_resume_bytes == 0 {
            DEFAULT_MAX_RESUME_BYTES
        } else {
            max_resume_bytes
        };

        let allowed_resume_types = [
            mime::APPLICATION_PDF.essence_str(),
            "application/msword",
            WORD_DOCX,
        ]
        .iter()
        .filter_map(|raw| raw.parse::<mime::Mime>().ok())
        .collect();

        Self {
            max_resume_bytes,
            allowed_resume_types,
        }
    }

    pub fn max_resume_bytes(&self) -> usize {
        self.max_resume_bytes
    }

    pub fn accepts_content_type(&self, content_type: &str) -> bool {
        match content_type.trim().parse::<mime::Mime>() {
            Ok(parsed) => self
                .allowed_resume_types
                .iter()
                .any(|allowed| allowed.essence_str() == parsed.essence_str()),
            Err(_) => false,
        }
    }
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESUME_BYTES)
    }
}

/// Form contents that passed validation, ready to be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedApplication {
    pub applicant: Applicant,
    pub experience: Option<TeachingExperience>,
    pub resume: Resume,
}

/// Guard responsible for turning raw forms into validated applications.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    policy: IntakePolicy,
}

impl IntakeGuard {
    pub fn with_policy(policy: IntakePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &IntakePolicy {
        &self.policy
    }

    /// Validate every field and collect all messages before failing.
    pub fn application_from_form(
        &self,
        form: ApplicationForm,
    ) -> Result<ValidatedApplication, ValidationErrors> {
        let mut errors = Vec::new();

        let first_name = required(form.fname);
        if first_name.is_none() {
            errors.push("First name is required.".to_string());
        }
        let last_name = required(form.lname);
        if last_name.is_none() {
            errors.push("Last name is required.".to_string());
        }
        let student_number = required(form.znumber);
        if student_number.is_none() {
            errors.push("Z Number is required.".to_string());
        }
        let email = required(form.email);
        match email.as_deref() {
            None => errors.push("Email is required.".to_string()),
            Some(address) if !looks_like_email(address) => {
                errors.push("Email must be a valid address.".to_string())
            }
            Some(_) => {}
        }

        let has_experience = match required(form.experience).as_deref() {
            None => {
                errors.push("Experience is required.".to_string());
                None
            }
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(_) => {
                errors.push(r#"Experience must be either "true" or "false"."#.to_string());
                None
            }
        };

        let experience = if has_experience == Some(true) {
            experience_from_form(form.from, form.to, form.relevant_courses, &mut errors)
        } else {
            None
        };

        let resume = match form.resume {
            None => {
                errors.push("Resume is required.".to_string());
                None
            }
            Some(resume) if resume.data.is_empty() => {
                errors.push("Resume is required.".to_string());
                None
            }
            Some(resume) => {
                if !self.policy.accepts_content_type(&resume.content_type) {
                    errors.push("Resume must be a PDF or Word document.".to_string());
                }
                if resume.data.len() > self.policy.max_resume_bytes {
                    errors.push(format!(
                        "Resume exceeds the {} byte limit.",
                        self.policy.max_resume_bytes
                    ));
                }
                Some(resume)
            }
        };

        if !errors.is_empty() {
            return Err(ValidationErrors { messages: errors });
        }

        match (first_name, last_name, email, student_number, resume) {
            (
                Some(first_name),
                Some(last_name),
                Some(email),
                Some(student_number),
                Some(resume),
            ) => Ok(ValidatedApplication {
                applicant: Applicant {
                    first_name,
                    last_name,
                    email,
                    student_number,
                },
                experience,
                resume,
            }),
            _ => Err(ValidationErrors::single("Application form is incomplete.")),
        }
    }
}

fn experience_from_form(
    from: Option<String>,
    to: Option<String>,
    relevant_courses: Option<String>,
    errors: &mut Vec<String>,
) -> Option<TeachingExperience> {
    let from = required(from);
    let to = required(to);
    if from.is_none() || to.is_none() {
        errors.push(
            r#"Both "from" and "to" dates are required when experience is true."#.to_string(),
        );
    }

    let from = from.and_then(|raw| {
        let parsed = parse_date(&raw);
        if parsed.is_none() {
            errors.push(r#""From" date must be a valid date (YYYY-MM-DD)."#.to_string());
        }
        parsed
    });
    let to = to.and_then(|raw| {
        let parsed = parse_date(&raw);
        if parsed.is_none() {
            errors.push(r#""To" date must be a valid date (YYYY-MM-DD)."#.to_string());
        }
        parsed
    });

    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            errors.push(r#""From" date cannot be later than "to" date."#.to_string());
        }
    }

    let relevant_courses = required(relevant_courses);
    if relevant_courses.is_none() {
        errors.push("Relevant courses are required when experience is true.".to_string());
    }

    Some(TeachingExperience {
        from: from?,
        to: to?,
        relevant_courses: relevant_courses?,
    })
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Accepts only what the SMTP mailer can address, and requires a dotted domain.
pub(crate) fn looks_like_email(address: &str) -> bool {
    address
        .parse::<Address>()
        .map(|parsed| {
            let domain = parsed.domain();
            domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        })
        .unwrap_or(false)
}
