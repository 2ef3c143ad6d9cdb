use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const MAX_USER_ID_LEN: usize = 64;

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identity of an authenticated user as resolved by the upstream gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Accepts 1..=64 ASCII alphanumerics, `-` or `_` after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= MAX_USER_ID_LEN
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(trimmed.to_string()))
    }
}

/// Course the application targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseId(pub String);

/// Caller role supplied alongside the user identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Applicant,
    Staff,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "applicant" => Some(Self::Applicant),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }
}

/// Review state set by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Selected,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 3] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Selected,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Selected => "selected",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.label() == raw)
    }
}

/// The applicant's answer once selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Declined,
}

impl OfferStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Declined => "declined",
        }
    }

    /// Only a decision can be submitted; `pending` is the initial state.
    pub fn parse_decision(raw: &str) -> Option<Self> {
        match raw {
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }
}

/// Personal details captured on the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// University "Z number".
    pub student_number: String,
}

/// Prior teaching or grading experience; only present when the applicant reports some.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingExperience {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub relevant_courses: String,
}

/// Uploaded resume kept inline with the application document.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Resume {
    pub fn summary(&self) -> ResumeSummary {
        ResumeSummary {
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            size: self.data.len(),
        }
    }
}

impl std::fmt::Debug for Resume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resume")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Resume metadata exposed in listings; the bytes are served separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeSummary {
    pub file_name: Option<String>,
    pub content_type: String,
    pub size: usize,
}

/// Raw multipart form fields before validation. Every text field arrives as an optional string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationForm {
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub email: Option<String>,
    pub znumber: Option<String>,
    pub experience: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub relevant_courses: Option<String>,
    pub resume: Option<Resume>,
}

/// The stored application document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub applicant: Applicant,
    pub experience: Option<TeachingExperience>,
    pub resume: Resume,
    pub status: ApplicationStatus,
    pub offer: OfferStatus,
    pub submitted_by: UserId,
    pub course: CourseId,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
