use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

use course_staffing::applications::{
    ApplicationFilter, ApplicationId, ApplicationRecord, ApplicationRepository, CourseId,
    MailError, RepositoryError, SmtpMailer, StatusEmail, StatusMailer, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local document store. Uniqueness checks and read-check-write updates each
/// happen under one lock acquisition.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl InMemoryApplicationRepository {
    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<ApplicationId, ApplicationRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.lock()?;
        let taken = guard.values().any(|existing| {
            existing.submitted_by == record.submitted_by && existing.course == record.course
        });
        if taken || guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn modify<E, F>(&self, id: &ApplicationId, apply: F) -> Result<ApplicationRecord, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut ApplicationRecord) -> Result<(), E>,
    {
        let mut guard = self.lock()?;
        let stored = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        // Rules run against a copy so a rejected change leaves the stored record untouched.
        let mut candidate = stored.clone();
        apply(&mut candidate)?;
        *stored = candidate.clone();
        Ok(candidate)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn find_by_submitter(
        &self,
        user: &UserId,
        course: &CourseId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .values()
            .find(|record| &record.submitted_by == user && &record.course == course)
            .cloned())
    }

    fn query(&self, filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.lock()?;
        let mut records: Vec<ApplicationRecord> = guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        records.sort_by(|a, b| (a.submitted_at, &a.id).cmp(&(b.submitted_at, &b.id)));
        Ok(records)
    }
}

/// Stand-in used when no SMTP relay is configured: the rendered e-mail goes to the log.
#[derive(Debug, Default, Clone)]
pub(crate) struct LogMailer;

impl StatusMailer for LogMailer {
    fn deliver(&self, email: &StatusEmail) -> Result<(), MailError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            status = email.status.label(),
            "smtp disabled; status e-mail logged instead of sent"
        );
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) enum ConfiguredMailer {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl StatusMailer for ConfiguredMailer {
    fn deliver(&self, email: &StatusEmail) -> Result<(), MailError> {
        match self {
            ConfiguredMailer::Smtp(mailer) => mailer.deliver(email),
            ConfiguredMailer::Log(mailer) => mailer.deliver(email),
        }
    }
}
