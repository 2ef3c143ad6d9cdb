//! Course staffing applications: intake, staff review, offer replies, and status e-mails.

pub mod catalog;
pub mod domain;
pub mod mailer;
pub mod notification;
pub mod repository;
pub mod requester;
pub mod router;
pub mod service;
pub(crate) mod validation;
pub mod views;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, CourseCatalog, CourseSummary, StaticCourseCatalog};
pub use domain::{
    Applicant, ApplicationForm, ApplicationId, ApplicationRecord, ApplicationStatus, CourseId,
    OfferStatus, Resume, ResumeSummary, Role, TeachingExperience, UserId,
};
pub use mailer::SmtpMailer;
pub use notification::{MailError, StatusEmail, StatusMailer, StatusNotice};
pub use repository::{ApplicationFilter, ApplicationRepository, FilterError, RepositoryError};
pub use requester::{Requester, USER_ID_HEADER, USER_ROLE_HEADER};
pub use router::application_router;
pub use service::{ApplicationListing, ApplicationService, ApplicationServiceError};
pub use validation::{IntakeGuard, IntakePolicy, ValidatedApplication, ValidationErrors};
