//! crates/saju_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Consultation, ConsultationStatus, GatewayApproval, NewConsultation, NewPayment, Payment,
    Product,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network),
/// but keeps enough classification for the endpoint layer to map status codes
/// and for the retry policy to tell transient failures from permanent ones.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The upstream service throttled us. Transient; eligible for retry.
    #[error("Upstream rate limit: {0}")]
    RateLimited(String),
    /// The upstream call timed out. Transient; eligible for retry.
    #[error("Upstream timeout: {0}")]
    Timeout(String),
    /// The payment gateway rejected the operation. Never retried.
    #[error("Gateway rejected: {code}: {message}")]
    Gateway { code: String, message: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// Transient failures are the only ones the retry policy may replay.
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::RateLimited(_) | PortError::Timeout(_))
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The narrow repository interface behind which all persistence hides, so the
/// orchestration endpoints are testable without a live database.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Catalog ---
    async fn list_active_products(&self) -> PortResult<Vec<Product>>;

    // --- Consultations ---
    async fn create_consultation(&self, new: NewConsultation) -> PortResult<Consultation>;

    /// Looks up by record id first, then by session id.
    async fn find_consultation(&self, key: &str) -> PortResult<Consultation>;

    async fn update_consultation(
        &self,
        id: Uuid,
        saju_data: Option<serde_json::Value>,
        status: Option<ConsultationStatus>,
    ) -> PortResult<Consultation>;

    // --- Payments ---
    async fn create_payment(&self, new: NewPayment) -> PortResult<Payment>;

    async fn find_payment_by_order_id(&self, order_id: &str) -> PortResult<Payment>;

    /// Atomically transitions a not-yet-`done` payment (pending or failed)
    /// to `done`, recording the gateway metadata. Returns false when the
    /// payment was already `done` (a concurrent confirm won); the row is
    /// left untouched then.
    async fn approve_payment(
        &self,
        order_id: &str,
        payment_key: &str,
        metadata: serde_json::Value,
        approved_at: DateTime<Utc>,
    ) -> PortResult<bool>;

    async fn mark_payment_failed(
        &self,
        order_id: &str,
        failure_code: &str,
        failure_message: &str,
    ) -> PortResult<()>;
}

/// The external text-generation API that turns a rendered prompt into
/// fortune prose.
#[async_trait]
pub trait FortuneTextService: Send + Sync {
    async fn generate_fortune(&self, prompt: &str) -> PortResult<String>;
}

/// The external payment gateway's confirm API. Financial operations are
/// never retried by callers.
#[async_trait]
pub trait PaymentGatewayService: Send + Sync {
    async fn confirm_payment(
        &self,
        payment_key: &str,
        order_id: &str,
        amount: i64,
    ) -> PortResult<GatewayApproval>;
}
