//! services/api/src/web/payments.rs
//!
//! Contains the Axum handlers for payment creation and confirmation.
//!
//! Confirmation is the only place a payment may reach `done`, and it always
//! requires a successful gateway round-trip first. The transition to `done`
//! is a compare-and-set in the repository, so racing confirms for the same
//! order fulfill exactly once. A `failed` payment may be confirmed again;
//! only `done` is terminal.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::state::AppState;
use saju_core::domain::{NewPayment, PaymentStatus};
use saju_core::ports::PortError;

//=========================================================================================
// API Payload Structs
//=========================================================================================

/// The request payload for creating a pending payment.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_name: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    /// Amount in KRW.
    pub amount: i64,
}

/// The request payload for confirming a payment after gateway checkout.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub payment_key: String,
    pub order_id: String,
    pub amount: i64,
}

/// Order ids look like `ORDER-<millis>-<6 random alphanumerics>`; the random
/// suffix keeps ids unique within one millisecond.
fn generate_order_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("ORDER-{}-{}", Utc::now().timestamp_millis(), suffix)
}

//=========================================================================================
// Payment Handlers
//=========================================================================================

/// Create a pending payment and return the gateway checkout parameters.
#[utoipa::path(
    post,
    path = "/api/payments/create",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Pending payment created with checkout parameters"),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_payment_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut bad_fields: Vec<String> = Vec::new();
    if payload.order_name.trim().is_empty() {
        bad_fields.push("orderName".to_string());
    }
    if payload.customer_name.trim().is_empty() {
        bad_fields.push("customerName".to_string());
    }
    if payload.amount <= 0 {
        bad_fields.push("amount".to_string());
    }
    if !bad_fields.is_empty() {
        return Err(ApiError::validation(
            "입력값이 올바르지 않습니다.",
            bad_fields,
        ));
    }

    let order_id = generate_order_id();
    let payment = state
        .db
        .create_payment(NewPayment {
            order_id,
            order_name: payload.order_name.trim().to_string(),
            customer_name: payload.customer_name.trim().to_string(),
            customer_email: payload.customer_email,
            product_id: payload.product_id,
            amount: payload.amount,
        })
        .await?;

    let base = &state.config.site_base_url;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "orderId": payment.order_id,
            "orderName": payment.order_name,
            "customerName": payment.customer_name,
            "amount": payment.amount,
            "successUrl": format!("{base}/payment/success"),
            "failUrl": format!("{base}/payment/fail"),
        })),
    ))
}

/// Confirm a payment against the gateway and record the approval.
#[utoipa::path(
    post,
    path = "/api/payments/confirm",
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Payment approved"),
        (status = 400, description = "Amount mismatch, already approved, or gateway rejection"),
        (status = 404, description = "Unknown order id")
    )
)]
pub async fn confirm_payment_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = state.db.find_payment_by_order_id(&payload.order_id).await?;

    // The stored amount is authoritative. A mismatch is rejected before any
    // idempotency shortcut and before the gateway is ever contacted.
    if payment.amount != payload.amount {
        return Err(ApiError::AmountMismatch {
            order_id: payload.order_id,
            expected: payment.amount,
            supplied: payload.amount,
        });
    }

    if payment.status == PaymentStatus::Done {
        return Err(ApiError::AlreadyApproved(payload.order_id));
    }

    // Financial call: one attempt, never retried.
    let approval = match state
        .gateway
        .confirm_payment(&payload.payment_key, &payload.order_id, payload.amount)
        .await
    {
        Ok(approval) => approval,
        Err(PortError::Gateway { code, message }) => {
            state
                .db
                .mark_payment_failed(&payload.order_id, &code, &message)
                .await?;
            return Err(ApiError::PaymentApprovalFailed { code, message });
        }
        Err(other) => return Err(other.into()),
    };

    let approved_at = approval.approved_at.unwrap_or_else(Utc::now);
    let updated = state
        .db
        .approve_payment(
            &payload.order_id,
            &approval.payment_key,
            approval.raw.clone(),
            approved_at,
        )
        .await?;
    if !updated {
        // A concurrent confirm won the compare-and-set.
        return Err(ApiError::AlreadyApproved(payload.order_id));
    }

    tracing::info!(order_id = %payload.order_id, amount = payload.amount, "payment approved");

    Ok(Json(json!({
        "orderId": payload.order_id,
        "status": "done",
        "amount": payload.amount,
        "paymentKey": approval.payment_key,
        "method": approval.method,
        "approvedAt": approved_at,
    })))
}
