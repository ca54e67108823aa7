//! # Chain-Indexer Webhook
//!
//! `POST /api/webhook/proof` — ingestion point for chain-event
//! notifications. Authenticated by the bearer-token middleware layered in
//! `crate::app`; the body is only read after authentication succeeds.
//!
//! A notification with no proof-submitted event acknowledges with
//! `status: "ignored"` — valid but irrelevant, not an error. The upstream
//! indexer redelivers on fault-class responses; dedup by transaction id
//! makes that safe.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use poa_core::extract_proof_event;

use crate::error::AppError;
use crate::state::AppState;

/// Acknowledgement returned to the chain indexer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    /// `"success"` or `"ignored"`.
    pub status: String,
    /// Id of the stored receipt, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<String>,
    /// Public URL of the stored receipt, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    /// Explanation, when ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookAck {
    fn success(receipt_id: String, receipt_url: String) -> Self {
        Self {
            status: "success".to_string(),
            receipt_id: Some(receipt_id),
            receipt_url: Some(receipt_url),
            message: None,
        }
    }

    fn ignored(message: &str) -> Self {
        Self {
            status: "ignored".to_string(),
            receipt_id: None,
            receipt_url: None,
            message: Some(message.to_string()),
        }
    }
}

/// Build the webhook router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/webhook/proof", post(ingest_notification))
}

/// POST /api/webhook/proof — ingest a chain-event notification.
#[utoipa::path(
    post,
    path = "/api/webhook/proof",
    request_body = Object,
    responses(
        (status = 200, description = "Receipt stored, or notification ignored", body = WebhookAck),
        (status = 401, description = "Missing or invalid bearer token", body = crate::error::ErrorBody),
        (status = 500, description = "Internal fault; the indexer should retry", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "webhook"
)]
pub(crate) async fn ingest_notification(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    // Unparseable bodies are a fault, not a client error: the indexer
    // only retries fault-class responses.
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::Internal(format!("unparseable notification body: {e}")))?;

    let Some(event) = extract_proof_event(&payload) else {
        tracing::info!("notification carried no proof-submitted event, ignoring");
        return Ok(Json(WebhookAck::ignored("No proof event found")));
    };

    let receipt = state.receipts.insert(event);
    tracing::info!(
        receipt_id = %receipt.id,
        txid = %receipt.txid,
        block_height = receipt.block_height,
        "stored proof receipt"
    );

    let url = state.receipt_url(&receipt.id);
    Ok(Json(WebhookAck::success(receipt.id, url)))
}
