use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use thiserror::Error;

use crate::models::ValidationError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("rejected by store: {0}")]
    Rejected(StoreError),
    #[error("invalid id format: {0:?}")]
    InvalidId(String),
    #[error(transparent)]
    Storage(StoreError),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("storage is unavailable")]
    Unavailable,
    #[error("service is not ready")]
    NotReady,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    /// Reports a store failure during create as a rejected payload.
    pub fn rejected(self) -> Self {
        match self {
            ApiError::Storage(e) => ApiError::Rejected(e),
            other => other,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::MalformedBody(_) | ApiError::Rejected(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidId(_) | ApiError::Storage(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Unavailable | ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self);
        }
        match self {
            ApiError::NotFound(_) => HttpResponse::build(status)
                .content_type("text/plain; charset=utf-8")
                .body(self.to_string()),
            _ => HttpResponse::build(status).json(ErrorResponse {
                error: self.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_map_each_failure_to_its_status() {
        let cases = vec![
            (ApiError::NotFound("Recipe"), StatusCode::NOT_FOUND),
            (
                ApiError::MalformedBody("EOF".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Rejected(StoreError::Unavailable("down".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::InvalidId("xyz".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Storage(StoreError::Unavailable("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Unavailable, StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::NotReady, StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{:?}", err);
            assert_eq!(err.error_response().status(), status, "{:?}", err);
        }
    }

    #[test]
    fn store_errors_become_rejections_on_create() {
        let err = ApiError::Storage(StoreError::Unavailable("down".to_string())).rejected();
        assert!(matches!(err, ApiError::Rejected(_)), "got {:?}", err);

        let err = ApiError::Unavailable.rejected();
        assert!(matches!(err, ApiError::Unavailable), "got {:?}", err);
    }

    #[test]
    fn not_found_is_plain_text() {
        let response = ApiError::NotFound("Ingredient").error_response();
        let content_type = response
            .headers()
            .get(actix_web::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));
        assert_eq!(
            ApiError::NotFound("Ingredient").to_string(),
            "Ingredient not found"
        );
    }
}
