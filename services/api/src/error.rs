//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its
//! mapping onto the structured JSON error responses. Full detail is logged
//! server-side; users only ever see the generic Korean messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::ConfigError;
use saju_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The client sent input it must fix; `fields` lists the offenders.
    #[error("Validation failed: {message} ({fields:?})")]
    Validation { message: String, fields: Vec<String> },

    #[error("Not found: {0}")]
    NotFound(String),

    /// The confirm amount disagrees with the amount stored at creation.
    #[error("Amount mismatch for order {order_id}: stored {expected}, supplied {supplied}")]
    AmountMismatch {
        order_id: String,
        expected: i64,
        supplied: i64,
    },

    /// The payment is already `done`; confirm is idempotent.
    #[error("Payment already approved: {0}")]
    AlreadyApproved(String),

    /// The gateway rejected the approval.
    #[error("Payment approval failed: {code}: {message}")]
    PaymentApprovalFailed { code: String, message: String },

    /// The text-generation upstream throttled us even after retries.
    #[error("Upstream rate limited: {0}")]
    RateLimited(String),

    /// The text-generation upstream timed out even after retries.
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(m) => ApiError::NotFound(m),
            PortError::RateLimited(m) => ApiError::RateLimited(m),
            PortError::Timeout(m) => ApiError::UpstreamTimeout(m),
            PortError::Gateway { code, message } => {
                ApiError::PaymentApprovalFailed { code, message }
            }
            PortError::Unexpected(m) => ApiError::Internal(m),
        }
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>, fields: Vec<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            fields,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. }
            | ApiError::AmountMismatch { .. }
            | ApiError::AlreadyApproved(_)
            | ApiError::PaymentApprovalFailed { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            ApiError::AlreadyApproved(_) => "ALREADY_APPROVED",
            ApiError::PaymentApprovalFailed { .. } => "PAYMENT_APPROVAL_FAILED",
            ApiError::RateLimited(_) => "RATE_LIMITED",
            ApiError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    /// The message shown to the end user. Internal failures share one
    /// generic message; the detail stays in the server log.
    fn user_message(&self) -> String {
        match self {
            ApiError::Validation { message, .. } => message.clone(),
            ApiError::NotFound(_) => "요청한 정보를 찾을 수 없습니다.".to_string(),
            ApiError::AmountMismatch { .. } => "결제 금액이 일치하지 않습니다.".to_string(),
            ApiError::AlreadyApproved(_) => "이미 승인된 결제입니다.".to_string(),
            ApiError::PaymentApprovalFailed { message, .. } => message.clone(),
            ApiError::RateLimited(_) => {
                "요청이 많아 분석이 지연되고 있습니다. 잠시 후 다시 시도해주세요.".to_string()
            }
            ApiError::UpstreamTimeout(_) => {
                "분석 요청이 시간 초과되었습니다. 잠시 후 다시 시도해주세요.".to_string()
            }
            _ => "서버 오류가 발생했습니다. 잠시 후 다시 시도해주세요.".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let mut body = json!({
            "error": {
                "code": self.code(),
                "message": self.user_message(),
            }
        });
        if let ApiError::Validation { fields, .. } = &self {
            body["error"]["fields"] = json!(fields);
        }

        (status, Json(body)).into_response()
    }
}
