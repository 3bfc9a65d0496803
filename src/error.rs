use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::services::ServiceError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A service failure while performing `action` (e.g. "create micropost").
    #[error("Failed to {action}: {source}")]
    Service {
        action: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn service(action: &'static str) -> impl FnOnce(ServiceError) -> AppError {
        move |source| AppError::Service { action, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Service { source, .. } => match source {
                ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
                ServiceError::Forbidden => StatusCode::FORBIDDEN,
                ServiceError::Conflict(_) => StatusCode::CONFLICT,
                e if e.is_foreign_key_violation() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message safe to show to clients.
    pub fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::Multipart(_) => "Malformed multipart body".to_string(),
            AppError::Io(_) => "Internal server error".to_string(),
            AppError::Service { action, source } => match source {
                ServiceError::Validation(msg) | ServiceError::Conflict(msg) => msg.clone(),
                ServiceError::NotFound(what) => format!("{} not found", what),
                ServiceError::Unauthorized => "Invalid credentials".to_string(),
                ServiceError::Forbidden => "Forbidden".to_string(),
                e if e.is_foreign_key_violation() => "Invalid reference".to_string(),
                _ => format!("Failed to {}", action),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }

        let body = json!({ "success": false, "message": self.public_message() });
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn response_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    fn service(source: ServiceError) -> AppError {
        AppError::service("do the thing")(source)
    }

    #[test]
    fn bad_request_returns_400() {
        assert_eq!(
            response_status(AppError::BadRequest("oops".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(
            response_status(AppError::NotFound("User not found".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            response_status(service(ServiceError::NotFound("Micropost"))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn service_kinds_map_consistently() {
        assert_eq!(
            response_status(service(ServiceError::Validation("x".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            response_status(service(ServiceError::Unauthorized)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            response_status(service(ServiceError::Forbidden)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            response_status(service(ServiceError::Conflict("dup".into()))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn foreign_key_violation_is_bad_request() {
        let err = service(ServiceError::Storage(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY),
            None,
        )));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Invalid reference");
    }

    #[test]
    fn storage_errors_are_generic_500() {
        let err = service(ServiceError::Storage(rusqlite::Error::InvalidQuery));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Failed to do the thing");
    }

    #[test]
    fn unauthorized_message_is_generic() {
        assert_eq!(
            service(ServiceError::Unauthorized).public_message(),
            "Invalid credentials"
        );
    }
}
