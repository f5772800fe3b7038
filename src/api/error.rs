//! Centralized error rendering.
//!
//! Handlers return [`ApiError`]. Its `IntoResponse` only sets the status and
//! stashes an [`ErrorReport`] in the response extensions; [`render_errors`]
//! turns the report into the JSON body, so the environment (and therefore
//! whether `stack` is included) is decided in one place. Panics are caught by
//! [`panic_response`] and rendered the same way as unexpected errors.

use crate::cli::globals::Environment;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::any::Any;
use thiserror::Error;
use tracing::error;

pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Expected failure with its own status, message and optional details.
    #[error("{message}")]
    Domain {
        status: StatusCode,
        message: String,
        errors: Vec<String>,
    },
    /// Anything else; always reported as 500.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Domain {
            status,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_errors(self, details: Vec<String>) -> Self {
        match self {
            Self::Domain {
                status, message, ..
            } => Self::Domain {
                status,
                message,
                errors: details,
            },
            other @ Self::Unexpected(_) => other,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Domain { status, .. } => *status,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What `render_errors` needs to build the body.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    status: StatusCode,
    message: String,
    errors: Option<Vec<String>>,
    stack: String,
}

impl From<ApiError> for ErrorReport {
    fn from(err: ApiError) -> Self {
        let status = err.status();
        let stack = format!("{err:?}");

        match err {
            ApiError::Domain {
                message, errors, ..
            } => Self {
                status,
                message,
                errors: Some(errors),
                stack,
            },
            ApiError::Unexpected(_) => Self::unexpected(stack),
        }
    }
}

impl ErrorReport {
    fn unexpected(stack: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: INTERNAL_SERVER_ERROR.to_string(),
            errors: None,
            stack,
        }
    }

    fn into_body(self, environment: Environment) -> ErrorBody {
        ErrorBody {
            success: false,
            message: self.message,
            errors: self.errors,
            stack: environment.is_development().then_some(self.stack),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response.extensions_mut().insert(ErrorReport::from(self));
        response
    }
}

/// Response middleware that renders any `ErrorReport` left by a handler.
pub async fn render_errors(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };

    error!(
        "{} {} failed with {}: {}",
        method, path, report.status, report.stack
    );

    let status = report.status;
    (status, Json(report.into_body(environment))).into_response()
}

/// `CatchPanicLayer` hook: a panic becomes an unexpected error.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| (*s).to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());

    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response
        .extensions_mut()
        .insert(ErrorReport::unexpected(format!("panic: {detail}")));
    response
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
