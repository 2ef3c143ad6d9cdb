use std::collections::HashMap;
use std::sync::{Arc, Barrier, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::applications::catalog::{CourseSummary, StaticCourseCatalog};
use crate::applications::domain::{
    ApplicationForm, ApplicationId, ApplicationRecord, CourseId, Resume, UserId,
};
use crate::applications::notification::{MailError, StatusEmail, StatusMailer};
use crate::applications::repository::{
    ApplicationFilter, ApplicationRepository, RepositoryError,
};
use crate::applications::validation::IntakePolicy;
use crate::applications::{application_router, ApplicationService, Requester};

pub(super) const COURSE: &str = "cop3530";
pub(super) const APPLICANT: &str = "user-ada";
pub(super) const STAFF: &str = "staff-john";
pub(super) const BOUNDARY: &str = "staffing-test-boundary";

pub(super) type TestService = ApplicationService<MemoryRepository, StaticCourseCatalog, MemoryMailer>;

pub(super) fn catalog() -> StaticCourseCatalog {
    StaticCourseCatalog::new([
        CourseSummary {
            id: CourseId(COURSE.to_string()),
            name: "Data Structures".to_string(),
            description: Some("Grader and lab assistant".to_string()),
        },
        CourseSummary {
            id: CourseId("cen4010".to_string()),
            name: "Principles of Software Engineering".to_string(),
            description: None,
        },
    ])
}

pub(super) fn pdf_resume() -> Resume {
    Resume {
        file_name: Some("ada-lovelace.pdf".to_string()),
        content_type: "application/pdf".to_string(),
        data: b"%PDF-1.7 resume".to_vec(),
    }
}

pub(super) fn form() -> ApplicationForm {
    ApplicationForm {
        fname: Some("Ada".to_string()),
        lname: Some("Lovelace".to_string()),
        email: Some("ada@fau.edu".to_string()),
        znumber: Some("Z23456789".to_string()),
        experience: Some("true".to_string()),
        from: Some("2023-01-09".to_string()),
        to: Some("2023-05-05".to_string()),
        relevant_courses: Some("COP 2210, COP 3530".to_string()),
        resume: Some(pdf_resume()),
    }
}

pub(super) fn no_experience_form() -> ApplicationForm {
    ApplicationForm {
        experience: Some("false".to_string()),
        from: None,
        to: None,
        relevant_courses: None,
        ..form()
    }
}

pub(super) fn applicant() -> Requester {
    Requester::applicant(APPLICANT)
}

pub(super) fn staff() -> Requester {
    Requester::staff(STAFF)
}

pub(super) fn course() -> CourseId {
    CourseId(COURSE.to_string())
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
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
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        let mut candidate = stored.clone();
        apply(&mut candidate)?;
        *stored = candidate.clone();
        Ok(candidate)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_submitter(
        &self,
        user: &UserId,
        course: &CourseId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| &record.submitted_by == user && &record.course == course)
            .cloned())
    }

    fn query(&self, filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut matches: Vec<ApplicationRecord> = guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        matches.sort_by(|a, b| (a.submitted_at, &a.id).cmp(&(b.submitted_at, &b.id)));
        Ok(matches)
    }
}

/// Claims nothing exists on lookup but refuses every insert, like a store that lost a race.
pub(super) struct RacingRepository;

impl ApplicationRepository for RacingRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn modify<E, F>(&self, _id: &ApplicationId, _apply: F) -> Result<ApplicationRecord, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut ApplicationRecord) -> Result<(), E>,
    {
        Err(RepositoryError::Unavailable("read only".to_string()).into())
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(None)
    }

    fn find_by_submitter(
        &self,
        _user: &UserId,
        _course: &CourseId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(None)
    }

    fn query(&self, _filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn modify<E, F>(&self, _id: &ApplicationId, _apply: F) -> Result<ApplicationRecord, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut ApplicationRecord) -> Result<(), E>,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_submitter(
        &self,
        _user: &UserId,
        _course: &CourseId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn query(&self, _filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Holds every `modify` call at a barrier so that concurrent updates reach the store together.
pub(super) struct GatedRepository {
    inner: MemoryRepository,
    gate: Barrier,
}

impl GatedRepository {
    pub(super) fn new(inner: MemoryRepository, callers: usize) -> Self {
        Self {
            inner,
            gate: Barrier::new(callers),
        }
    }
}

impl ApplicationRepository for GatedRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn modify<E, F>(&self, id: &ApplicationId, apply: F) -> Result<ApplicationRecord, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut ApplicationRecord) -> Result<(), E>,
    {
        self.gate.wait();
        self.inner.modify(id, apply)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn find_by_submitter(
        &self,
        user: &UserId,
        course: &CourseId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.inner.find_by_submitter(user, course)
    }

    fn query(&self, filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.inner.query(filter)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryMailer {
    sent: Arc<Mutex<Vec<StatusEmail>>>,
}

impl MemoryMailer {
    pub(super) fn sent(&self) -> Vec<StatusEmail> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }
}

impl StatusMailer for MemoryMailer {
    fn deliver(&self, email: &StatusEmail) -> Result<(), MailError> {
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push(email.clone());
        Ok(())
    }
}

pub(super) struct OfflineMailer;

impl StatusMailer for OfflineMailer {
    fn deliver(&self, _email: &StatusEmail) -> Result<(), MailError> {
        Err(MailError::Transport("connection refused".to_string()))
    }
}

pub(super) fn build_service() -> (TestService, Arc<MemoryRepository>, Arc<MemoryMailer>) {
    let repository = Arc::new(MemoryRepository::default());
    let mailer = Arc::new(MemoryMailer::default());
    let service = ApplicationService::new(
        repository.clone(),
        Arc::new(catalog()),
        mailer.clone(),
        IntakePolicy::default(),
        "Committee Head",
    );
    (service, repository, mailer)
}

pub(super) fn selected_application(service: &TestService) -> ApplicationRecord {
    let record = service
        .submit(&applicant(), course(), form())
        .expect("submission succeeds");
    service
        .update_status(&staff(), &record.id, "selected")
        .expect("status update succeeds")
}

pub(super) fn application_router_with_service(service: TestService) -> axum::Router {
    application_router(Arc::new(service))
}

pub(super) fn multipart_body(fields: &[(&str, &str)], resume: Option<&Resume>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(resume) = resume {
        let file_name = resume.file_name.as_deref().unwrap_or("resume");
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{file_name}\"\r\nContent-Type: {}\r\n\r\n",
                resume.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&resume.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(super) fn form_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("fname", "Ada"),
        ("lname", "Lovelace"),
        ("email", "ada@fau.edu"),
        ("znumber", "Z23456789"),
        ("experience", "true"),
        ("from", "2023-01-09"),
        ("to", "2023-05-05"),
        ("relevant_courses", "COP 2210, COP 3530"),
    ]
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
