//! services/api/src/adapters/toss.rs
//!
//! This module contains the adapter for the Toss Payments gateway.
//! It implements the `PaymentGatewayService` port from the `core` crate.
//!
//! Confirm calls are never retried here or by any caller: a second attempt
//! after an ambiguous failure could double-charge the customer.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::json;

use saju_core::domain::GatewayApproval;
use saju_core::ports::{PaymentGatewayService, PortError, PortResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PaymentGatewayService` against the Toss
/// Payments REST API.
#[derive(Clone)]
pub struct TossGatewayAdapter {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl TossGatewayAdapter {
    /// Creates a new `TossGatewayAdapter`.
    pub fn new(api_base: String, secret_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    /// Toss uses HTTP Basic auth with the secret key as the user name and
    /// an empty password.
    fn authorization_header(&self) -> String {
        format!("Basic {}", BASE64.encode(format!("{}:", self.secret_key)))
    }
}

fn network_error(err: reqwest::Error) -> PortError {
    if err.is_timeout() {
        PortError::Timeout(format!("payment gateway timed out: {err}"))
    } else {
        PortError::Unexpected(format!("payment gateway request failed: {err}"))
    }
}

//=========================================================================================
// `PaymentGatewayService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PaymentGatewayService for TossGatewayAdapter {
    async fn confirm_payment(
        &self,
        payment_key: &str,
        order_id: &str,
        amount: i64,
    ) -> PortResult<GatewayApproval> {
        let url = format!("{}/v1/payments/confirm", self.api_base);
        let body = json!({
            "paymentKey": payment_key,
            "orderId": order_id,
            "amount": amount,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.authorization_header())
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let payload: serde_json::Value = response.json().await.map_err(network_error)?;

        if !status.is_success() {
            // Error bodies carry {"code": ..., "message": ...}.
            let code = payload["code"].as_str().unwrap_or("UNKNOWN").to_string();
            let message = payload["message"]
                .as_str()
                .unwrap_or("결제 승인에 실패했습니다.")
                .to_string();
            return Err(PortError::Gateway { code, message });
        }

        let approved_at = payload["approvedAt"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(GatewayApproval {
            payment_key: payload["paymentKey"]
                .as_str()
                .unwrap_or(payment_key)
                .to_string(),
            method: payload["method"].as_str().map(str::to_string),
            approved_at,
            raw: payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_header_is_basic_with_empty_password() {
        let adapter = TossGatewayAdapter::new(
            "https://api.tosspayments.com".to_string(),
            "test_sk_abc123".to_string(),
        );
        // base64("test_sk_abc123:")
        assert_eq!(
            adapter.authorization_header(),
            format!("Basic {}", BASE64.encode("test_sk_abc123:"))
        );
        assert!(adapter.authorization_header().starts_with("Basic "));
    }

    #[test]
    fn trailing_slash_on_the_base_url_is_normalized() {
        let adapter = TossGatewayAdapter::new(
            "https://api.tosspayments.com/".to_string(),
            "sk".to_string(),
        );
        assert_eq!(adapter.api_base, "https://api.tosspayments.com");
    }
}
