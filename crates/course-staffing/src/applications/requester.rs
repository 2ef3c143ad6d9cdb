use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::domain::{Role, UserId};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Caller identity resolved by the upstream auth gateway and forwarded in headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub user_id: UserId,
    pub role: Role,
}

impl Requester {
    pub fn applicant(user_id: &str) -> Self {
        Self {
            user_id: UserId(user_id.to_string()),
            role: Role::Applicant,
        }
    }

    pub fn staff(user_id: &str) -> Self {
        Self {
            user_id: UserId(user_id.to_string()),
            role: Role::Staff,
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unauthenticated;

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> Response {
        let payload = json!({ "error": "Unauthorized: User not authenticated." });
        (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = Unauthenticated;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let user_id = header(USER_ID_HEADER)
            .as_deref()
            .and_then(UserId::parse)
            .ok_or(Unauthenticated)?;
        let role = match header(USER_ROLE_HEADER) {
            Some(raw) => Role::parse(&raw).ok_or(Unauthenticated)?,
            None => Role::Applicant,
        };

        Ok(Self { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Requester, Unauthenticated> {
        let (mut parts, _) = request.into_parts();
        Requester::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn defaults_to_applicant_role() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "user-1")
            .body(())
            .expect("request builds");
        let requester = extract(request).await.expect("authenticated");
        assert_eq!(requester, Requester::applicant("user-1"));
    }

    #[tokio::test]
    async fn reads_staff_role() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "staff-9")
            .header(USER_ROLE_HEADER, "Staff")
            .body(())
            .expect("request builds");
        assert!(extract(request).await.expect("authenticated").is_staff());
    }

    #[tokio::test]
    async fn missing_or_unknown_identity_is_rejected() {
        let anonymous = Request::builder().body(()).expect("request builds");
        assert_eq!(extract(anonymous).await, Err(Unauthenticated));

        let bad_role = Request::builder()
            .header(USER_ID_HEADER, "user-1")
            .header(USER_ROLE_HEADER, "root")
            .body(())
            .expect("request builds");
        assert_eq!(extract(bad_role).await, Err(Unauthenticated));
    }
}
