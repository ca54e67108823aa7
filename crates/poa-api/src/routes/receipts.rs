//! # Receipt Query Endpoints
//!
//! Read-only lookups over the receipt store. No mutation, no side
//! effects; "not found" is a 404, never a fault.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `GET` | `/receipt/:id` | `receipt_detail` |
//! | `GET` | `/api/receipt/by-txid?txid=` | `receipt_by_txid` |
//! | `GET` | `/api/receipts/by-user?address=` | `receipts_by_user` |
//! | `GET` | `/api/verify?hash=` | `verify_proof` |

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use poa_core::Receipt;
use poa_store::{Verification, DEFAULT_LIST_LIMIT};

use crate::error::AppError;
use crate::state::AppState;

/// Block-explorer transaction page, linked from receipt details.
const EXPLORER_TX_URL: &str = "https://explorer.stacks.co/txid";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Public receipt detail, including the explorer deep link.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDetail {
    pub id: String,
    pub txid: String,
    pub user_address: String,
    pub proof_hash: String,
    pub block_height: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<u64>,
    pub timestamp: DateTime<Utc>,
    /// Block-explorer deep link for independent verification.
    pub verify_url: String,
}

impl From<Receipt> for ReceiptDetail {
    fn from(receipt: Receipt) -> Self {
        let verify_url = format!("{EXPLORER_TX_URL}/{}", receipt.txid);
        Self {
            id: receipt.id,
            txid: receipt.txid,
            user_address: receipt.user_address,
            proof_hash: receipt.proof_hash,
            block_height: receipt.block_height,
            submission_id: receipt.submission_id,
            timestamp: receipt.timestamp,
            verify_url,
        }
    }
}

/// Envelope for per-user receipt listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiptListResponse {
    /// Raw receipt records, descending block height, at most 50.
    #[schema(value_type = Vec<Object>)]
    pub receipts: Vec<Receipt>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TxidQuery {
    txid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddressQuery {
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HashQuery {
    hash: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the query-endpoint router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/receipt/:id", get(receipt_detail))
        .route("/api/receipt/by-txid", get(receipt_by_txid))
        .route("/api/receipts/by-user", get(receipts_by_user))
        .route("/api/verify", get(verify_proof))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /receipt/:id — public receipt detail.
#[utoipa::path(
    get,
    path = "/receipt/{id}",
    params(("id" = String, Path, description = "Receipt id")),
    responses(
        (status = 200, description = "Receipt detail with explorer link", body = ReceiptDetail),
        (status = 404, description = "No receipt with this id", body = crate::error::ErrorBody),
    ),
    tag = "receipts"
)]
pub(crate) async fn receipt_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReceiptDetail>, AppError> {
    let receipt = state
        .receipts
        .get_by_id(&id)
        .ok_or_else(|| AppError::NotFound("Receipt not found".to_string()))?;
    Ok(Json(receipt.into()))
}

/// GET /api/receipt/by-txid — raw receipt record by transaction id.
#[utoipa::path(
    get,
    path = "/api/receipt/by-txid",
    params(("txid" = String, Query, description = "On-chain transaction id")),
    responses(
        (status = 200, description = "Raw receipt record"),
        (status = 400, description = "Missing txid parameter", body = crate::error::ErrorBody),
        (status = 404, description = "No receipt for this txid", body = crate::error::ErrorBody),
    ),
    tag = "receipts"
)]
pub(crate) async fn receipt_by_txid(
    State(state): State<AppState>,
    Query(query): Query<TxidQuery>,
) -> Result<Json<Receipt>, AppError> {
    let txid = query
        .txid
        .ok_or_else(|| AppError::BadRequest("txid parameter required".to_string()))?;
    let receipt = state
        .receipts
        .get_by_txid(&txid)
        .ok_or_else(|| AppError::NotFound("Receipt not found".to_string()))?;
    Ok(Json(receipt))
}

/// GET /api/receipts/by-user — a user's receipts, most recent chain
/// activity first.
#[utoipa::path(
    get,
    path = "/api/receipts/by-user",
    params(("address" = String, Query, description = "Chain account address")),
    responses(
        (status = 200, description = "Receipts for the user, possibly empty", body = ReceiptListResponse),
        (status = 400, description = "Missing address parameter", body = crate::error::ErrorBody),
    ),
    tag = "receipts"
)]
pub(crate) async fn receipts_by_user(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<ReceiptListResponse>, AppError> {
    let address = query
        .address
        .ok_or_else(|| AppError::BadRequest("address parameter required".to_string()))?;
    let receipts = state.receipts.list_by_user(&address, DEFAULT_LIST_LIMIT);
    Ok(Json(ReceiptListResponse { receipts }))
}

/// GET /api/verify — whether a proof hash has an ingested receipt.
#[utoipa::path(
    get,
    path = "/api/verify",
    params(("hash" = String, Query, description = "Content hash to verify")),
    responses(
        (status = 200, description = "Verification outcome"),
        (status = 400, description = "Missing hash parameter", body = crate::error::ErrorBody),
    ),
    tag = "receipts"
)]
pub(crate) async fn verify_proof(
    State(state): State<AppState>,
    Query(query): Query<HashQuery>,
) -> Result<Json<Verification>, AppError> {
    let hash = query
        .hash
        .ok_or_else(|| AppError::BadRequest("hash parameter required".to_string()))?;
    Ok(Json(state.receipts.verify(&hash)))
}
