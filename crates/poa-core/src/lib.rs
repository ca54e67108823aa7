//! # poa-core — Proof-of-Action Domain Types
//!
//! Shared domain layer for the proof-of-action receipt service:
//!
//! - [`Receipt`] — the durable record attesting that a proof submission
//!   was ingested. Append-only: receipts are never mutated or deleted.
//! - [`ProofEvent`] — the normalized descriptor extracted from a chain
//!   indexer notification.
//! - [`extract_proof_event`] — tolerant extraction over the notification
//!   payload dialects emitted by chain indexers (Chainhook and friends).
//!
//! Extraction is a pure function over an untyped JSON tree. Malformed or
//! missing substructure is treated as absent, never as an error — an
//! irrelevant notification is a valid outcome, not a fault.

pub mod event;
pub mod receipt;

pub use event::{extract_proof_event, ProofEvent};
pub use receipt::Receipt;
