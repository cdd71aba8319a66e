//! Error types for the tracker API server.
//!
//! [`ApiError`] covers requests that could not be carried out at all.
//! It converts into an Axum response carrying the same
//! `{success, error, message}` shape as every other endpoint, with a
//! matching HTTP status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hunt_db::StoreError;
use hunt_reports::ReportError;

use crate::response::ApiResponse;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body or query was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store kept conflicting after every retry.
    #[error("busy: {0}")]
    Busy(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Busy(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Busy(_) => "busy",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::ReportNotFound(id) => Self::NotFound(format!("report {id}")),
            ReportError::UnknownMob(id) => Self::NotFound(format!("mob {id}")),
            ReportError::InvalidReport(msg) | ReportError::InvalidMemo(msg) => {
                Self::BadRequest(msg)
            }
            ReportError::Store(err) => err.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_conflict() {
            tracing::warn!(error = %err, "Transaction gave up after retries");
            Self::Busy(String::from("the tracker is busy, try again"))
        } else {
            tracing::error!(error = %err, "Store failure");
            Self::Internal(String::from("internal error"))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match self {
            Self::BadRequest(msg) | Self::NotFound(msg) | Self::Busy(msg) | Self::Internal(msg) => {
                msg
            }
        };
        let body = ApiResponse::<()>::failure(code, message);
        (status, axum::Json(body)).into_response()
    }
}
