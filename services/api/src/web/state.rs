//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use saju_core::ports::{DatabaseService, FortuneTextService, PaymentGatewayService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub fortune: Arc<dyn FortuneTextService>,
    pub gateway: Arc<dyn PaymentGatewayService>,
    pub config: Arc<Config>,
}
