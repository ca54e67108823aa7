//! The receipt record — one accepted proof submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable record of one accepted proof submission.
///
/// `id` and `txid` are each globally unique across the store. A receipt
/// is created exactly once, on the first ingestion of its transaction id,
/// and is immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Short, URL-safe, system-generated identifier. Primary handle for
    /// public receipt URLs.
    pub id: String,
    /// Identifier of the on-chain transaction that carried the event.
    /// At most one receipt exists per txid — this is the dedup key.
    pub txid: String,
    /// Chain account that submitted the proof.
    pub user_address: String,
    /// Content hash submitted on-chain.
    pub proof_hash: String,
    /// Block height at which the transaction was included.
    pub block_height: u64,
    /// Contract-assigned sequence id, when the print payload carries one.
    #[serde(default)]
    pub submission_id: Option<u64>,
    /// Record creation time, assigned at insertion.
    pub timestamp: DateTime<Utc>,
    /// Same instant as `timestamp`; kept as a separate field to match the
    /// persisted record layout.
    pub created_at: DateTime<Utc>,
}
