//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::notifications::Notice;
use crate::ports::PortError;
use crate::pricing::error::PricingError;
use crate::pricing::responses::PricingErrorResponse;
use crate::pricing::services::QuoteError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("Payment failed: {source}")]
    PaymentFailed {
        source: PortError,
        notice: Option<Notice>,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::Pricing(e) => AppError::Pricing(e),
            QuoteError::Port(e) => AppError::Port(e),
            QuoteError::PaymentFailed { source, notice } => {
                AppError::PaymentFailed { source, notice }
            }
            QuoteError::UnknownQuote(_) => AppError::NotFound(err.to_string()),
            QuoteError::MissingLocation(_) => AppError::BadRequest(err.to_string()),
            QuoteError::AlreadyPaid(_) => AppError::Conflict(err.to_string()),
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Pricing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Port(_) | AppError::PaymentFailed { .. } => StatusCode::BAD_GATEWAY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Pricing(e) => e.error_type(),
            AppError::Port(_) => "upstream_error",
            AppError::PaymentFailed { .. } => "payment_failed",
            AppError::BadRequest(_) => "bad_request",
            AppError::Conflict(_) => "conflict",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Pricing(e) => Some(e.details()),
            AppError::PaymentFailed {
                notice: Some(notice),
                ..
            } => serde_json::to_value(notice)
                .ok()
                .map(|notice| serde_json::json!({ "notice": notice })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Port(e) => tracing::error!("Upstream error: {}", e),
            AppError::PaymentFailed { source, .. } => tracing::warn!("Payment failed: {}", source),
            other => tracing::debug!("Request rejected: {}", other),
        }

        let body = PricingErrorResponse {
            error_type: self.error_type().to_string(),
            message: self.to_string(),
            details: self.details(),
        };

        (self.status(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
