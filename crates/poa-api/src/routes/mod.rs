//! Route modules. Each module exposes a `router()` assembling its own
//! paths; `crate::app` merges them.

pub mod receipts;
pub mod webhook;
