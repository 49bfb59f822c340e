//! # Fiscal Dispatcher
//!
//! The orchestration layer: business events in, fiscalized submissions out.
//!
//! ```text
//! on_invoice_created / on_invoice_paid
//!        |
//!        v
//!  preconditions -> Router -> build payload -> Ledger (idempotent)
//!        |                                        |
//!        v                                        v
//!  fiscal_status write-back            SendFiscalRequest job
//!                                                 |
//!                                                 v
//!                                  Worker: sign -> send -> parse
//!                                  retry with backoff on transport error
//! ```
//!
//! The event callbacks validate and enqueue only; all wire traffic happens
//! on the worker. Retry policy: transport errors requeue with exponential
//! backoff up to `max_attempts`; remote rejections and credential problems
//! are terminal.

pub mod config;
pub mod dispatcher;
pub mod ports;
pub mod router;
pub mod worker;

pub use config::DispatcherConfig;
pub use dispatcher::{Dispatcher, SendFiscalRequest};
pub use ports::{InvoiceStatusSink, TenantConfigStore};
pub use router::{build_adapter, decide_regime, route, route_for_regime, Route};
pub use worker::Worker;
