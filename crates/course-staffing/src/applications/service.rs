use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::catalog::{CatalogError, CourseCatalog, CourseSummary};
use super::domain::{
    ApplicationForm, ApplicationId, ApplicationRecord, ApplicationStatus, CourseId, OfferStatus,
    Resume,
};
use super::notification::{MailError, StatusEmail, StatusMailer, StatusNotice};
use super::repository::{ApplicationFilter, ApplicationRepository, FilterError, RepositoryError};
use super::requester::Requester;
use super::validation::{IntakeGuard, IntakePolicy, ValidationErrors};

/// Service composing intake validation, the document store, the course catalog, and the mailer.
pub struct ApplicationService<R, C, M> {
    guard: Arc<IntakeGuard>,
    repository: Arc<R>,
    catalog: Arc<C>,
    mailer: Arc<M>,
    signature: String,
}

/// A stored application paired with the course it targets, when the catalog still knows it.
#[derive(Debug, Clone)]
pub struct ApplicationListing {
    pub record: ApplicationRecord,
    pub course: Option<CourseSummary>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

impl<R, C, M> ApplicationService<R, C, M>
where
    R: ApplicationRepository + 'static,
    C: CourseCatalog + 'static,
    M: StatusMailer + 'static,
{
    pub fn new(
        repository: Arc<R>,
        catalog: Arc<C>,
        mailer: Arc<M>,
        policy: IntakePolicy,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            guard: Arc::new(IntakeGuard::with_policy(policy)),
            repository,
            catalog,
            mailer,
            signature: signature.into(),
        }
    }

    pub fn intake_policy(&self) -> &IntakePolicy {
        self.guard.policy()
    }

    /// Validate and store a new application for `course` on behalf of the requester.
    pub fn submit(
        &self,
        requester: &Requester,
        course: CourseId,
        form: ApplicationForm,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        self.catalog
            .find(&course)?
            .ok_or(ApplicationServiceError::CourseNotFound)?;

        let validated = self.guard.application_from_form(form)?;

        if self
            .repository
            .find_by_submitter(&requester.user_id, &course)?
            .is_some()
        {
            return Err(ApplicationServiceError::Duplicate);
        }

        let now = Utc::now();
        let record = ApplicationRecord {
            id: next_application_id(),
            applicant: validated.applicant,
            experience: validated.experience,
            resume: validated.resume,
            status: ApplicationStatus::Pending,
            offer: OfferStatus::Pending,
            submitted_by: requester.user_id.clone(),
            course,
            submitted_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(record).map_err(|err| match err {
            RepositoryError::Conflict => ApplicationServiceError::Duplicate,
            other => other.into(),
        })?;

        info!(
            application_id = %stored.id.0,
            course = %stored.course.0,
            submitted_by = %stored.submitted_by.0,
            "application submitted"
        );
        Ok(stored)
    }

    /// Applications matching the filter, each joined with its course.
    pub fn list(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationListing>, ApplicationServiceError> {
        let records = self.repository.query(filter)?;
        let mut courses: HashMap<CourseId, Option<CourseSummary>> = HashMap::new();
        let mut listings = Vec::with_capacity(records.len());

        for record in records {
            let course = match courses.get(&record.course) {
                Some(cached) => cached.clone(),
                None => {
                    let found = self.catalog.find(&record.course)?;
                    courses.insert(record.course.clone(), found.clone());
                    found
                }
            };
            listings.push(ApplicationListing { record, course });
        }

        Ok(listings)
    }

    /// Staff decision on an application.
    pub fn update_status(
        &self,
        requester: &Requester,
        application_id: &ApplicationId,
        raw_status: &str,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        if !requester.is_staff() {
            return Err(ApplicationServiceError::Forbidden(
                "Only staff may change application status.",
            ));
        }

        let status =
            ApplicationStatus::parse(raw_status).ok_or(ApplicationServiceError::InvalidStatus)?;

        let mut previous = status;
        let record = self.repository.modify(application_id, |record| {
            previous = record.status;
            record.status = status;
            record.updated_at = Utc::now();
            Ok::<(), ApplicationServiceError>(())
        })?;

        info!(
            application_id = %application_id.0,
            from = previous.label(),
            to = status.label(),
            changed_by = %requester.user_id.0,
            "application status updated"
        );
        Ok(record)
    }

    /// The applicant's one-time answer to a selection.
    pub fn update_offer(
        &self,
        requester: &Requester,
        application_id: &ApplicationId,
        raw_offer: &str,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let offer =
            OfferStatus::parse_decision(raw_offer).ok_or(ApplicationServiceError::InvalidOffer)?;

        let record = self.repository.modify(application_id, |record| {
            if record.submitted_by != requester.user_id {
                return Err(ApplicationServiceError::Forbidden(
                    "Only the applicant may respond to this offer.",
                ));
            }
            if record.status != ApplicationStatus::Selected {
                return Err(ApplicationServiceError::OfferUnavailable);
            }
            if record.offer != OfferStatus::Pending {
                return Err(ApplicationServiceError::OfferAlreadyDecided(record.offer));
            }

            record.offer = offer;
            record.updated_at = Utc::now();
            Ok(())
        })?;

        info!(
            application_id = %application_id.0,
            offer = offer.label(),
            "offer answered"
        );
        Ok(record)
    }

    /// Resume bytes for staff or the submitting applicant.
    pub fn resume(
        &self,
        requester: &Requester,
        application_id: &ApplicationId,
    ) -> Result<Resume, ApplicationServiceError> {
        let record = self
            .repository
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;

        if !requester.is_staff() && record.submitted_by != requester.user_id {
            return Err(ApplicationServiceError::Forbidden(
                "You may not view this resume.",
            ));
        }

        Ok(record.resume)
    }

    /// Render and deliver a status e-mail for any authenticated caller. Delivery may block
    /// on the mail transport.
    pub fn notify(
        &self,
        requester: &Requester,
        notice: StatusNotice,
    ) -> Result<StatusEmail, ApplicationServiceError> {
        let email = StatusEmail::compose(notice, &self.signature)?;
        self.mailer.deliver(&email)?;
        info!(
            to = %email.to,
            status = email.status.label(),
            requested_by = %requester.user_id.0,
            "status notification dispatched"
        );
        Ok(email)
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(r#"Invalid status. Status must be either "rejected" or "selected" or "pending"."#)]
    InvalidStatus,
    #[error(r#"Invalid offer acceptance. Offer must be either "declined" or "accepted"."#)]
    InvalidOffer,
    #[error("Course not found.")]
    CourseNotFound,
    #[error("You have already submitted an application for this course.")]
    Duplicate,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("Offers can only be answered for selected applications.")]
    OfferUnavailable,
    #[error("Offer has already been {}.", .0.label())]
    OfferAlreadyDecided(OfferStatus),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Mail(#[from] MailError),
}
