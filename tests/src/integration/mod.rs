//! End-to-end flows over the dispatcher, ledger, and gateway.

pub mod invariants;
pub mod scenarios;
