//! # Fiscal Ledger
//!
//! Persistence core for submission tracking: one `FiscalDocument` per
//! business document, `FiscalRequest` rows per logical submission, and one
//! `FiscalResponse` row per attempt (synthetic entries for transport
//! failures), so the attempt history is always reconstructible.
//!
//! ## Guarantees
//!
//! | Guarantee | Mechanism |
//! |-----------|-----------|
//! | One document per `(tenant, type, id)` | get-or-create in [`ports::Ledger::open_document`] |
//! | One in-flight request per idempotency key | duplicate check in `new_request` |
//! | Valid state moves only | transition table in `fiscal_types::RequestStatus` |
//! | Aggregate status mirrors latest request | reconciliation inside `transition` |
//!
//! The in-memory adapter keeps every write under one lock acquisition, which
//! stands in for the transaction boundary a database-backed adapter would use.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::memory::InMemoryLedger;
pub use domain::entities::{FiscalDocument, FiscalRequest, FiscalResponse};
pub use domain::errors::LedgerError;
pub use ports::Ledger;
