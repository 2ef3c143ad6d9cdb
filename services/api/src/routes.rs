use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use course_staffing::applications::{
    application_router, ApplicationRepository, ApplicationService, CourseCatalog, StatusMailer,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_application_routes<R, C, M>(
    service: Arc<ApplicationService<R, C, M>>,
) -> axum::Router
where
    R: ApplicationRepository + 'static,
    C: CourseCatalog + 'static,
    M: StatusMailer + 'static,
{
    application_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryApplicationRepository, LogMailer};
    use axum::body::Body;
    use axum::http::Request;
    use course_staffing::applications::{
        CourseId, CourseSummary, IntakePolicy, StaticCourseCatalog, USER_ID_HEADER,
        USER_ROLE_HEADER,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(readiness: Arc<AtomicBool>) -> axum::Router {
        let catalog = StaticCourseCatalog::new([CourseSummary {
            id: CourseId("cop3530".to_string()),
            name: "Data Structures".to_string(),
            description: None,
        }]);
        let service = Arc::new(ApplicationService::new(
            Arc::new(InMemoryApplicationRepository::default()),
            Arc::new(catalog),
            Arc::new(LogMailer),
            IntakePolicy::default(),
            "Committee Head",
        ));
        let state = AppState {
            readiness,
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_application_routes(service).layer(Extension(state))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_flag() {
        let readiness = Arc::new(AtomicBool::new(false));
        let router = app(readiness.clone());

        let request = || {
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .expect("request builds")
        };

        let waiting = router
            .clone()
            .oneshot(request())
            .await
            .expect("router responds");
        assert_eq!(waiting.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(waiting).await["status"], "initializing");

        readiness.store(true, Ordering::Release);
        let ready = router.oneshot(request()).await.expect("router responds");
        assert_eq!(ready.status(), StatusCode::OK);
        assert_eq!(json_body(ready).await["status"], "ready");
    }

    #[tokio::test]
    async fn metrics_are_rendered_as_text() {
        let router = app(Arc::new(AtomicBool::new(true)));
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn application_routes_are_mounted() {
        let router = app(Arc::new(AtomicBool::new(true)));
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/applications")
                    .header(USER_ID_HEADER, "staff-1")
                    .header(USER_ROLE_HEADER, "staff")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await["message"],
            "No applications found."
        );
    }
}
