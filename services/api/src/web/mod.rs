pub mod payments;
pub mod rest;
pub mod saju;
pub mod state;


use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use state::AppState;

/// Builds the application router with every API route attached.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/categories", get(rest::list_categories_handler))
        .route("/api/products", get(rest::list_products_handler))
        .route("/api/consultations", post(rest::create_consultation_handler))
        .route(
            "/api/consultations/{id}",
            get(rest::get_consultation_handler).patch(rest::update_consultation_handler),
        )
        .route("/api/saju/analyze", post(saju::analyze_handler))
        .route("/api/saju/calculate", post(saju::calculate_handler))
        .route("/api/payments/create", post(payments::create_payment_handler))
        .route("/api/payments/confirm", post(payments::confirm_payment_handler))
        .with_state(state)
}
