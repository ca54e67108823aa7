//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Holds the receipt store (the only mutable
//! state in the process, owned and mutated exclusively through its own
//! methods) and the startup configuration.

use std::sync::Arc;

use poa_store::ReceiptStore;

use crate::config::AppConfig;

/// Shared application state. Clone-friendly via the `Arc`-wrapped store.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The durable receipt repository.
    pub receipts: Arc<ReceiptStore>,
    /// Service configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(receipts: ReceiptStore, config: AppConfig) -> Self {
        Self {
            receipts: Arc::new(receipts),
            config,
        }
    }

    /// The public URL for a receipt id.
    pub fn receipt_url(&self, receipt_id: &str) -> String {
        format!("{}/receipt/{receipt_id}", self.config.public_base_url)
    }
}
