//! # poa-store — Receipt Repository
//!
//! Durable, indexed store over [`Receipt`] records. All receipts live in
//! memory behind four secondary indexes (`by_id`, `by_txid`, `by_hash`,
//! `by_user`), rebuilt wholesale when the store is opened; the durable
//! state is a single JSON artifact holding the full ordered receipt list.
//!
//! ## Idempotency
//!
//! Chain indexers redeliver notifications. [`ReceiptStore::insert`] dedups
//! by transaction id: a redelivered event returns the existing receipt
//! unchanged and the store does not grow.
//!
//! ## Durability policy
//!
//! Every insert performs a write-through durable write before returning.
//! A failed durable write is logged and does not roll back the in-memory
//! insert — an accepted inconsistency window. Callers wanting strict
//! durability can check [`ReceiptStore::flush`] explicitly.
//!
//! ## Concurrency
//!
//! Interior mutability via `parking_lot::RwLock` (non-poisonable). The
//! check-then-insert sequence and the durable write run under a single
//! write lock, so concurrent inserts for the same txid cannot race; the
//! lock is never held across an await point (all store I/O is synchronous).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use parking_lot::RwLock;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use poa_core::{ProofEvent, Receipt};

/// Default cap on `list_by_user` results.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Errors from the durable layer of the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the snapshot file failed.
    #[error("receipt snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The snapshot file is not valid JSON of the expected shape.
    #[error("receipt snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Outcome of a verification lookup.
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    /// Whether a receipt with the queried hash exists.
    pub verified: bool,
    /// The matching receipt, when verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
}

/// On-disk snapshot layout: the full ordered receipt list.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    receipts: Vec<Receipt>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    receipts: &'a [Receipt],
}

/// In-memory state: the append-only receipt log plus derived indexes.
/// Index values are positions in `receipts`.
#[derive(Debug, Default)]
struct Inner {
    receipts: Vec<Receipt>,
    by_id: HashMap<String, usize>,
    by_txid: HashMap<String, usize>,
    by_hash: HashMap<String, usize>,
    by_user: HashMap<String, Vec<usize>>,
}

impl Inner {
    fn from_receipts(receipts: Vec<Receipt>) -> Self {
        let mut inner = Self {
            receipts,
            ..Self::default()
        };
        for position in 0..inner.receipts.len() {
            inner.index(position);
        }
        inner
    }

    /// Add the receipt at `position` to all secondary indexes.
    ///
    /// `by_hash` keeps the first-inserted receipt when several share a
    /// hash; the other unique indexes never see duplicates by invariant.
    fn index(&mut self, position: usize) {
        let receipt = &self.receipts[position];
        self.by_id.insert(receipt.id.clone(), position);
        self.by_txid.insert(receipt.txid.clone(), position);
        self.by_hash
            .entry(receipt.proof_hash.clone())
            .or_insert(position);
        self.by_user
            .entry(receipt.user_address.clone())
            .or_default()
            .push(position);
    }
}

/// Durable, indexed repository of proof receipts.
///
/// Constructed once at startup from the durable snapshot; all mutation
/// goes through [`ReceiptStore::insert`]. The indexes are private — no
/// shared global mutable state.
#[derive(Debug)]
pub struct ReceiptStore {
    inner: RwLock<Inner>,
    path: PathBuf,
}

impl ReceiptStore {
    /// Open the store, loading the full receipt list from `path` and
    /// rebuilding all indexes. A missing file is an empty store; a
    /// corrupt file is an error — silently starting empty would let the
    /// next write-through destroy the receipt log.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Snapshot>(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            inner: RwLock::new(Inner::from_receipts(snapshot.receipts)),
            path,
        })
    }

    /// Insert a receipt for the extracted event, or return the existing
    /// one when the transaction id was already ingested (idempotent).
    ///
    /// The existence check, the in-memory append, and the write-through
    /// durable write all happen under one write lock. A failed durable
    /// write is logged and the insert still stands.
    pub fn insert(&self, event: ProofEvent) -> Receipt {
        let mut inner = self.inner.write();

        if let Some(&position) = inner.by_txid.get(&event.txid) {
            let existing = inner.receipts[position].clone();
            tracing::debug!(
                txid = %event.txid,
                receipt_id = %existing.id,
                "duplicate delivery, returning existing receipt"
            );
            return existing;
        }

        let id = generate_receipt_id(&inner.by_id);
        let now = Utc::now();
        let receipt = Receipt {
            id,
            txid: event.txid,
            user_address: event.user_address,
            proof_hash: event.proof_hash,
            block_height: event.block_height,
            submission_id: event.submission_id,
            timestamp: now,
            created_at: now,
        };

        let position = inner.receipts.len();
        inner.receipts.push(receipt.clone());
        inner.index(position);

        if let Err(err) = persist(&self.path, &inner.receipts) {
            tracing::error!(
                error = %err,
                path = %self.path.display(),
                receipt_id = %receipt.id,
                "durable write failed after in-memory insert"
            );
        }

        receipt
    }

    /// Look up a receipt by its public id.
    pub fn get_by_id(&self, id: &str) -> Option<Receipt> {
        let inner = self.inner.read();
        inner.by_id.get(id).map(|&p| inner.receipts[p].clone())
    }

    /// Look up a receipt by transaction id.
    pub fn get_by_txid(&self, txid: &str) -> Option<Receipt> {
        let inner = self.inner.read();
        inner.by_txid.get(txid).map(|&p| inner.receipts[p].clone())
    }

    /// Look up a receipt by proof hash. When several receipts share a
    /// hash, the first-inserted one is returned.
    pub fn get_by_hash(&self, proof_hash: &str) -> Option<Receipt> {
        let inner = self.inner.read();
        inner
            .by_hash
            .get(proof_hash)
            .map(|&p| inner.receipts[p].clone())
    }

    /// All receipts for a user, ordered by descending block height,
    /// truncated to `limit`.
    pub fn list_by_user(&self, user_address: &str, limit: usize) -> Vec<Receipt> {
        let inner = self.inner.read();
        let mut receipts: Vec<Receipt> = inner
            .by_user
            .get(user_address)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&p| inner.receipts[p].clone())
                    .collect()
            })
            .unwrap_or_default();
        receipts.sort_by(|a, b| b.block_height.cmp(&a.block_height));
        receipts.truncate(limit);
        receipts
    }

    /// Whether a receipt with the exact proof hash exists.
    pub fn verify(&self, proof_hash: &str) -> Verification {
        match self.get_by_hash(proof_hash) {
            Some(receipt) => Verification {
                verified: true,
                receipt: Some(receipt),
            },
            None => Verification {
                verified: false,
                receipt: None,
            },
        }
    }

    /// Number of receipts in the store.
    pub fn len(&self) -> usize {
        self.inner.read().receipts.len()
    }

    /// Whether the store holds no receipts.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the full snapshot durably, reporting the result. For callers
    /// that want a checkable durability guarantee beyond the best-effort
    /// write-through performed by [`ReceiptStore::insert`].
    pub fn flush(&self) -> Result<(), StoreError> {
        let inner = self.inner.read();
        persist(&self.path, &inner.receipts)
    }
}

/// Generate a short, URL-safe receipt id: 8 random bytes, base64url
/// without padding. Regenerates on the astronomically unlikely collision
/// so the id-uniqueness invariant never depends on luck.
fn generate_receipt_id(existing: &HashMap<String, usize>) -> String {
    loop {
        let mut bytes = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut bytes);
        let id = URL_SAFE_NO_PAD.encode(bytes);
        if !existing.contains_key(&id) {
            return id;
        }
    }
}

/// Write the snapshot to a sibling temp file, then rename into place so a
/// crash mid-write never truncates the previous snapshot.
fn persist(path: &Path, receipts: &[Receipt]) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(&SnapshotRef { receipts })?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event(txid: &str, user: &str, hash: &str, height: u64) -> ProofEvent {
        ProofEvent {
            txid: txid.to_string(),
            user_address: user.to_string(),
            proof_hash: hash.to_string(),
            block_height: height,
            submission_id: None,
        }
    }

    fn temp_store() -> (tempfile::TempDir, ReceiptStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ReceiptStore::open(dir.path().join("receipts.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn open_missing_file_is_empty_store() {
        let (_dir, store) = temp_store();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn insert_assigns_id_and_timestamps() {
        let (_dir, store) = temp_store();
        let receipt = store.insert(sample_event("0xabc", "SP1", "0xhash", 100));
        assert!(!receipt.id.is_empty());
        assert_eq!(receipt.txid, "0xabc");
        assert_eq!(receipt.block_height, 100);
        assert_eq!(receipt.timestamp, receipt.created_at);
        // base64url alphabet only — safe inside a URL path segment.
        assert!(receipt
            .id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn insert_is_idempotent_by_txid() {
        let (_dir, store) = temp_store();
        let first = store.insert(sample_event("0xabc", "SP1", "0xhash", 100));
        let second = store.insert(sample_event("0xabc", "SP1", "0xhash", 100));
        assert_eq!(first.id, second.id);
        assert_eq!(first.timestamp, second.timestamp);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ids_and_txids_are_pairwise_distinct() {
        let (_dir, store) = temp_store();
        for n in 0..20 {
            store.insert(sample_event(&format!("0x{n}"), "SP1", &format!("h{n}"), n));
        }
        let mut ids: Vec<String> = (0..20)
            .map(|n| store.get_by_txid(&format!("0x{n}")).unwrap().id)
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
        assert_eq!(store.len(), 20);
    }

    #[test]
    fn lookups_by_each_key() {
        let (_dir, store) = temp_store();
        let receipt = store.insert(sample_event("0xabc", "SP1", "0xhash", 100));
        assert_eq!(store.get_by_id(&receipt.id).unwrap().txid, "0xabc");
        assert_eq!(store.get_by_txid("0xabc").unwrap().id, receipt.id);
        assert_eq!(store.get_by_hash("0xhash").unwrap().id, receipt.id);
        assert!(store.get_by_id("missing").is_none());
        assert!(store.get_by_txid("0xmissing").is_none());
        assert!(store.get_by_hash("0xmissing").is_none());
    }

    #[test]
    fn get_by_hash_first_inserted_wins() {
        let (_dir, store) = temp_store();
        let first = store.insert(sample_event("0x1", "SP1", "0xshared", 1));
        let _second = store.insert(sample_event("0x2", "SP2", "0xshared", 2));
        assert_eq!(store.get_by_hash("0xshared").unwrap().id, first.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn list_by_user_orders_by_descending_block_height() {
        let (_dir, store) = temp_store();
        store.insert(sample_event("0x1", "SP1", "h1", 5));
        store.insert(sample_event("0x2", "SP1", "h2", 200));
        store.insert(sample_event("0x3", "SP1", "h3", 50));
        store.insert(sample_event("0x4", "SP-other", "h4", 999));

        let receipts = store.list_by_user("SP1", DEFAULT_LIST_LIMIT);
        let heights: Vec<u64> = receipts.iter().map(|r| r.block_height).collect();
        assert_eq!(heights, vec![200, 50, 5]);
    }

    #[test]
    fn list_by_user_truncates_to_limit() {
        let (_dir, store) = temp_store();
        for n in 0..10 {
            store.insert(sample_event(&format!("0x{n}"), "SP1", &format!("h{n}"), n));
        }
        assert_eq!(store.list_by_user("SP1", 3).len(), 3);
    }

    #[test]
    fn list_by_user_unknown_user_is_empty() {
        let (_dir, store) = temp_store();
        assert!(store.list_by_user("SP-nobody", DEFAULT_LIST_LIMIT).is_empty());
    }

    #[test]
    fn verify_reflects_hash_existence() {
        let (_dir, store) = temp_store();
        store.insert(sample_event("0xabc", "SP1", "0xstored", 100));

        let hit = store.verify("0xstored");
        assert!(hit.verified);
        assert_eq!(hit.receipt.unwrap().txid, "0xabc");

        let miss = store.verify("0xnotstored");
        assert!(!miss.verified);
        assert!(miss.receipt.is_none());
    }

    #[test]
    fn receipts_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipts.json");

        let id = {
            let store = ReceiptStore::open(&path).unwrap();
            store
                .insert(ProofEvent {
                    submission_id: Some(7),
                    ..sample_event("0xabc", "SP1", "0xhash", 100)
                })
                .id
        };

        let reopened = ReceiptStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        let receipt = reopened.get_by_id(&id).unwrap();
        assert_eq!(receipt.txid, "0xabc");
        assert_eq!(receipt.submission_id, Some(7));
        // Indexes are rebuilt, not just the list.
        assert_eq!(reopened.get_by_txid("0xabc").unwrap().id, id);
        assert_eq!(reopened.list_by_user("SP1", DEFAULT_LIST_LIMIT).len(), 1);
    }

    #[test]
    fn open_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipts.json");
        fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            ReceiptStore::open(&path),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn insert_stands_when_durable_write_fails() {
        // Snapshot path inside a directory that does not exist: open
        // succeeds (missing file is an empty store) but every durable
        // write fails.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-subdir").join("receipts.json");
        let store = ReceiptStore::open(&path).unwrap();

        let receipt = store.insert(sample_event("0xabc", "SP1", "0xhash", 100));
        assert_eq!(receipt.txid, "0xabc");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_by_txid("0xabc").unwrap().id, receipt.id);

        // The failure is observable through the explicit durability check.
        assert!(matches!(store.flush(), Err(StoreError::Io(_))));
    }

    #[test]
    fn flush_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipts.json");
        let store = ReceiptStore::open(&path).unwrap();
        store.insert(sample_event("0xabc", "SP1", "0xhash", 100));
        store.flush().unwrap();

        let bytes = fs::read(&path).unwrap();
        let snapshot: Snapshot = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(snapshot.receipts.len(), 1);
        assert_eq!(snapshot.receipts[0].txid, "0xabc");
    }

    #[test]
    fn verification_serializes_without_receipt_when_unverified() {
        let miss = Verification {
            verified: false,
            receipt: None,
        };
        let json = serde_json::to_value(&miss).unwrap();
        assert_eq!(json, serde_json::json!({ "verified": false }));
    }
}
