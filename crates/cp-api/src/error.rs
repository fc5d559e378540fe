//! Maps `AppError` onto HTTP responses at the adapter boundary.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use cp_core::error::AppError;
use serde_json::json;
use thiserror::Error;

/// Newtype so the web error mapping lives in this crate, not in cp-core.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AppError);

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::NotFound(_, _) => StatusCode::NOT_FOUND,
            AppError::DuplicateUsername(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Infrastructure detail stays in the log, not in the payload.
        let message = match &self.0 {
            AppError::Internal(detail) => {
                log::error!("internal error: {detail}");
                "internal service error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}
