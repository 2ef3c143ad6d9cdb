use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Multipart, MultipartError},
        rejection::JsonRejection,
        DefaultBodyLimit, Path, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::catalog::CourseCatalog;
use super::domain::{ApplicationForm, ApplicationId, CourseId, Resume};
use super::notification::{StatusMailer, StatusNotice};
use super::repository::{ApplicationFilter, ApplicationRepository, RepositoryError};
use super::requester::Requester;
use super::service::{ApplicationService, ApplicationServiceError};
use super::views::{
    ApplicationListingView, OfferChangeView, StatusChangeView, SubmittedApplicationView,
};

/// Room left for the text fields and multipart framing on top of the resume itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default, rename = "userId")]
    pub(crate) user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    #[serde(default)]
    pub(crate) status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OfferUpdateRequest {
    #[serde(default)]
    pub(crate) offer: Option<String>,
}

/// Router builder exposing the application endpoints.
///
/// `/courses/:id/applications` takes a course id on POST and an application id on PUT.
pub fn application_router<R, C, M>(service: Arc<ApplicationService<R, C, M>>) -> Router
where
    R: ApplicationRepository + 'static,
    C: CourseCatalog + 'static,
    M: StatusMailer + 'static,
{
    let body_limit = service
        .intake_policy()
        .max_resume_bytes()
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route(
            "/courses/:id/applications",
            post(submit_handler::<R, C, M>).put(update_status_handler::<R, C, M>),
        )
        .route(
            "/courses/:id/applications/offerupdate",
            put(update_offer_handler::<R, C, M>),
        )
        .route("/applications", get(list_handler::<R, C, M>))
        .route(
            "/applications/:application_id/resume",
            get(resume_handler::<R, C, M>),
        )
        .route("/notifystatus", post(notify_handler::<R, C, M>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

pub(crate) async fn submit_handler<R, C, M>(
    State(service): State<Arc<ApplicationService<R, C, M>>>,
    Path(course_id): Path<String>,
    requester: Requester,
    multipart: Multipart,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CourseCatalog + 'static,
    M: StatusMailer + 'static,
{
    let form = match read_application_form(multipart).await {
        Ok(form) => form,
        Err(err) => return multipart_error_response(err),
    };

    match service.submit(&requester, CourseId(course_id), form) {
        Ok(record) => {
            let payload = json!({
                "message": "Application submitted successfully.",
                "application": SubmittedApplicationView::from(&record),
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_status_handler<R, C, M>(
    State(service): State<Arc<ApplicationService<R, C, M>>>,
    Path(application_id): Path<String>,
    requester: Requester,
    payload: Result<axum::Json<StatusUpdateRequest>, JsonRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CourseCatalog + 'static,
    M: StatusMailer + 'static,
{
    let axum::Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => return json_rejection_response(rejection),
    };
    let id = ApplicationId(application_id);
    let raw_status = request.status.unwrap_or_default();
    match service.update_status(&requester, &id, raw_status.trim()) {
        Ok(record) => {
            let payload = json!({
                "message": format!(
                    "Application status updated successfully to \"{}\".",
                    record.status.label()
                ),
                "application": StatusChangeView::from(&record),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_offer_handler<R, C, M>(
    State(service): State<Arc<ApplicationService<R, C, M>>>,
    Path(application_id): Path<String>,
    requester: Requester,
    payload: Result<axum::Json<OfferUpdateRequest>, JsonRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CourseCatalog + 'static,
    M: StatusMailer + 'static,
{
    let axum::Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => return json_rejection_response(rejection),
    };
    let id = ApplicationId(application_id);
    let raw_offer = request.offer.unwrap_or_default();
    match service.update_offer(&requester, &id, raw_offer.trim()) {
        Ok(record) => {
            let payload = json!({
                "message": format!("Offer updated successfully to \"{}\".", record.offer.label()),
                "application": OfferChangeView::from(&record),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R, C, M>(
    State(service): State<Arc<ApplicationService<R, C, M>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CourseCatalog + 'static,
    M: StatusMailer + 'static,
{
    let filter =
        match ApplicationFilter::from_query(query.status.as_deref(), query.user_id.as_deref()) {
            Ok(filter) => filter,
            Err(err) => return error_response(err.into()),
        };

    match service.list(&filter) {
        Ok(listings) if listings.is_empty() => {
            let payload = json!({ "message": "No applications found." });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Ok(listings) => {
            let applications: Vec<ApplicationListingView> =
                listings.into_iter().map(ApplicationListingView::from).collect();
            let payload = json!({ "applications": applications });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn resume_handler<R, C, M>(
    State(service): State<Arc<ApplicationService<R, C, M>>>,
    Path(application_id): Path<String>,
    requester: Requester,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CourseCatalog + 'static,
    M: StatusMailer + 'static,
{
    let id = ApplicationId(application_id);
    match service.resume(&requester, &id) {
        Ok(resume) => resume_response(resume),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn notify_handler<R, C, M>(
    State(service): State<Arc<ApplicationService<R, C, M>>>,
    requester: Requester,
    payload: Result<axum::Json<StatusNotice>, JsonRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CourseCatalog + 'static,
    M: StatusMailer + 'static,
{
    let axum::Json(notice) = match payload {
        Ok(notice) => notice,
        Err(rejection) => return json_rejection_response(rejection),
    };
    let outcome = tokio::task::spawn_blocking(move || service.notify(&requester, notice)).await;

    match outcome {
        Ok(Ok(email)) => {
            let payload = json!({
                "message": "Status sent to your email. Please verify to continue.",
                "applications": {
                    "email": email.to,
                    "fname": email.recipient_name,
                    "course": email.course,
                },
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(Err(err)) => error_response(err),
        Err(join_error) => {
            error!(error = %join_error, "status notification task failed");
            server_error()
        }
    }
}

pub(crate) async fn read_application_form(
    mut multipart: Multipart,
) -> Result<ApplicationForm, MultipartError> {
    let mut form = ApplicationForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.is_empty());
                let declared = field
                    .content_type()
                    .map(str::to_string)
                    .filter(|content_type| content_type != FALLBACK_CONTENT_TYPE);
                let data = field.bytes().await?;
                let content_type = declared
                    .or_else(|| {
                        file_name.as_deref().and_then(|name| {
                            mime_guess::from_path(name).first_raw().map(str::to_string)
                        })
                    })
                    .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

                form.resume = Some(Resume {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "fname" => form.fname = Some(field.text().await?),
            "lname" => form.lname = Some(field.text().await?),
            "email" => form.email = Some(field.text().await?),
            "znumber" => form.znumber = Some(field.text().await?),
            "experience" => form.experience = Some(field.text().await?),
            "from" => form.from = Some(field.text().await?),
            "to" => form.to = Some(field.text().await?),
            "relevant_courses" => form.relevant_courses = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}

fn resume_response(resume: Resume) -> Response {
    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(&resume.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    headers.insert(header::CONTENT_TYPE, content_type);

    if let Some(name) = resume.file_name.as_deref() {
        let sanitized: String = name.chars().filter(|c| *c != '"' && *c != '\\').collect();
        if let Ok(value) = HeaderValue::from_str(&format!("inline; filename=\"{sanitized}\"")) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }

    (StatusCode::OK, headers, resume.data).into_response()
}

fn multipart_error_response(err: MultipartError) -> Response {
    let status = err.status();
    warn!(error = %err, %status, "rejected application upload");
    let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "Application upload exceeds the size limit."
    } else {
        "Malformed multipart payload."
    };
    let status = if status.is_client_error() {
        status
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, axum::Json(json!({ "error": message }))).into_response()
}

fn json_rejection_response(rejection: JsonRejection) -> Response {
    let status = rejection.status();
    warn!(error = %rejection.body_text(), %status, "rejected JSON payload");
    let message = if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
        "Expected a JSON request body."
    } else {
        "Malformed JSON payload."
    };
    (status, axum::Json(json!({ "error": message }))).into_response()
}

pub(crate) fn error_response(err: ApplicationServiceError) -> Response {
    let (status, payload) = match &err {
        ApplicationServiceError::Validation(errors) => {
            (StatusCode::BAD_REQUEST, json!({ "error": errors.messages }))
        }
        ApplicationServiceError::Filter(_)
        | ApplicationServiceError::InvalidStatus
        | ApplicationServiceError::InvalidOffer => {
            (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }))
        }
        ApplicationServiceError::CourseNotFound => {
            (StatusCode::NOT_FOUND, json!({ "error": err.to_string() }))
        }
        ApplicationServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": "Application not found." }),
        ),
        ApplicationServiceError::Duplicate
        | ApplicationServiceError::OfferUnavailable
        | ApplicationServiceError::OfferAlreadyDecided(_) => {
            (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
        }
        ApplicationServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            json!({ "error": "Application already exists." }),
        ),
        ApplicationServiceError::Forbidden(message) => {
            (StatusCode::FORBIDDEN, json!({ "error": message }))
        }
        ApplicationServiceError::Mail(mail_error) => {
            error!(error = %mail_error, "status e-mail delivery failed");
            (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "Unable to deliver status email." }),
            )
        }
        ApplicationServiceError::Repository(RepositoryError::Unavailable(_))
        | ApplicationServiceError::Catalog(_) => {
            error!(error = %err, "application request failed");
            return server_error();
        }
    };

    (status, axum::Json(payload)).into_response()
}

fn server_error() -> Response {
    let payload = json!({ "error": "Server error. Please try again later." });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}
