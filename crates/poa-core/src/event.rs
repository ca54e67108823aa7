//! Extraction of proof-submitted events from chain indexer notifications.
//!
//! Indexer payloads are heterogeneous: the same logical event has shipped
//! under several shapes across indexer versions. Rather than speculative
//! field probing, extraction runs an ordered list of named event-source
//! matchers per transaction and stops at the first event whose payload
//! carries the `proof-submitted` discriminator.

use serde_json::Value;

/// Normalized proof-submission descriptor extracted from a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofEvent {
    /// On-chain transaction id carrying the event.
    pub txid: String,
    /// Chain account that submitted the proof.
    pub user_address: String,
    /// Content hash submitted.
    pub proof_hash: String,
    /// Block height at which the transaction was included.
    pub block_height: u64,
    /// Contract-assigned sequence id, when present in the print payload.
    pub submission_id: Option<u64>,
}

/// Event-type labels that denote a smart-contract print/event log entry.
const PRINT_EVENT_LABELS: &[&str] = &["SmartContractEvent", "print_event", "smart_contract_log"];

/// Discriminator value identifying the proof-submitted domain event.
const PROOF_SUBMITTED: &str = "proof-submitted";

/// Named event-source matchers, one per known payload dialect, tried in
/// priority order for every transaction.
const EVENT_SOURCES: &[(&str, fn(&Value) -> Option<&[Value]>)] = &[
    ("receipt-events", receipt_events),
    ("operations", operations_events),
    ("events", top_level_events),
];

/// Events nested under the transaction's receipt metadata
/// (`tx.metadata.receipt.events`) — the Chainhook predicate shape.
fn receipt_events(tx: &Value) -> Option<&[Value]> {
    as_slice(tx.get("metadata")?.get("receipt")?.get("events")?)
}

/// Events under a transaction-level `operations` array.
fn operations_events(tx: &Value) -> Option<&[Value]> {
    as_slice(tx.get("operations")?)
}

/// Events under a transaction-level `events` array.
fn top_level_events(tx: &Value) -> Option<&[Value]> {
    as_slice(tx.get("events")?)
}

fn as_slice(value: &Value) -> Option<&[Value]> {
    value.as_array().map(|a| a.as_slice())
}

/// Whether the event node is labeled as a contract print/event log entry.
fn is_print_event(event: &Value) -> bool {
    event
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|label| PRINT_EVENT_LABELS.contains(&label))
}

/// Locate the event's structured payload. Indexer dialects have carried it
/// at `event.data.value`, `event.contract_event.value`, or directly at
/// `event.data`.
fn event_payload(event: &Value) -> Option<&Value> {
    if let Some(value) = event.get("data").and_then(|d| d.get("value")) {
        if value.is_object() {
            return Some(value);
        }
    }
    if let Some(value) = event.get("contract_event").and_then(|c| c.get("value")) {
        if value.is_object() {
            return Some(value);
        }
    }
    event.get("data").filter(|d| d.is_object())
}

/// The transaction id, under either of its historical field names.
fn transaction_id(tx: &Value) -> Option<&str> {
    tx.get("transaction_identifier")
        .and_then(|t| t.get("hash"))
        .and_then(Value::as_str)
        .or_else(|| tx.get("txid").and_then(Value::as_str))
}

/// The inclusion height: preferred from the print payload itself, falling
/// back to the enclosing block's identifier.
fn block_height(data: &Value, block: &Value) -> Option<u64> {
    data.get("block-height")
        .and_then(Value::as_u64)
        .or_else(|| data.get("block_height").and_then(Value::as_u64))
        .or_else(|| {
            block
                .get("block_identifier")
                .and_then(|b| b.get("index"))
                .and_then(Value::as_u64)
        })
        .or_else(|| block.get("height").and_then(Value::as_u64))
}

fn build_descriptor(block: &Value, tx: &Value, data: &Value) -> Option<ProofEvent> {
    Some(ProofEvent {
        txid: transaction_id(tx)?.to_string(),
        user_address: data.get("user").and_then(Value::as_str)?.to_string(),
        proof_hash: data.get("hash").and_then(Value::as_str)?.to_string(),
        block_height: block_height(data, block)?,
        submission_id: data.get("submission-id").and_then(Value::as_u64),
    })
}

/// Extract the first proof-submitted event from a notification payload.
///
/// Blocks are searched in order, then transactions, then event sources in
/// matcher priority order, then events; extraction stops at the first
/// match. `None` means "no relevant event" — a valid ignore outcome, not
/// an error. Missing or malformed substructure is treated as absent.
pub fn extract_proof_event(payload: &Value) -> Option<ProofEvent> {
    let blocks = payload.get("apply").and_then(Value::as_array)?;

    for block in blocks {
        let transactions = block
            .get("transactions")
            .and_then(Value::as_array)
            .map(|t| t.as_slice())
            .unwrap_or(&[]);

        for tx in transactions {
            for (source, events_in) in EVENT_SOURCES {
                let Some(events) = events_in(tx) else { continue };

                for event in events {
                    if !is_print_event(event) {
                        continue;
                    }
                    let Some(data) = event_payload(event) else {
                        continue;
                    };
                    if data.get("event").and_then(Value::as_str) != Some(PROOF_SUBMITTED) {
                        continue;
                    }
                    match build_descriptor(block, tx, data) {
                        Some(descriptor) => {
                            tracing::debug!(
                                source,
                                txid = %descriptor.txid,
                                "matched proof-submitted event"
                            );
                            return Some(descriptor);
                        }
                        None => {
                            tracing::debug!(
                                source,
                                "proof-submitted event missing required fields, skipping"
                            );
                        }
                    }
                }
            }
        }
    }

    None
}
