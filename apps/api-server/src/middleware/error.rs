//! Mapping of failures to problem-detail responses.

use actix_web::{HttpRequest, HttpResponse, ResponseError, error, http::StatusCode};
use forum_core::error::{DomainError, RepoError};
use forum_shared::{ErrorResponse, FieldError};

/// Every failure a handler can answer with.
///
/// Missing topics are not errors: handlers answer those with an empty 404.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal: {0}")]
    Internal(String),
    #[error("{} invalid field(s)", .0.len())]
    Validation(Vec<FieldError>),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::BadRequest(detail) => ErrorResponse::bad_request(detail),
            Self::Conflict(detail) => ErrorResponse::new(409, "Conflict").with_detail(detail),
            Self::Validation(errors) => ErrorResponse::validation(errors.clone()),
            Self::Internal(cause) => {
                tracing::error!(%cause, "Request failed");
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(violations) => Self::Validation(
                violations
                    .into_iter()
                    .map(|v| FieldError::new(v.field, v.message))
                    .collect(),
            ),
            DomainError::Repository(e) => e.into(),
            DomainError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Constraint(msg) => Self::Conflict(msg),
            RepoError::NotFound => Self::Conflict("topic changed concurrently".to_string()),
            RepoError::Connection(_) | RepoError::Query(_) | RepoError::Transaction(_) => {
                tracing::error!(error = %err, "Store failure");
                Self::Internal("store failure".to_string())
            }
        }
    }
}

/// Extractor failures (malformed JSON, bad query string, non-numeric path)
/// rendered as problem responses instead of actix's plain-text default.
pub fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

pub fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

pub fn path_error_handler(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use forum_core::error::FieldViolation;

    #[actix_web::test]
    async fn test_validation_lists_every_field() {
        let err: AppError = DomainError::Validation(vec![
            FieldViolation::new("pagina", "must be zero or greater"),
            FieldViolation::new("quantidade", "must be between 1 and 100"),
        ])
        .into();

        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], 400);
        assert_eq!(json["errors"][0]["field"], "pagina");
        assert_eq!(json["errors"][1]["field"], "quantidade");
    }

    #[actix_web::test]
    async fn test_store_failure_hides_details() {
        let err: AppError =
            DomainError::Repository(RepoError::Connection("password rejected".to_string())).into();

        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("password"));
    }

    #[test]
    fn test_constraint_is_conflict() {
        let err: AppError = RepoError::Constraint("fk_topics_course".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
