//! Inner layer: pure payload construction, signing, and parsing logic.
//!
//! Nothing in this module touches the network or the ledger; everything is a
//! function of its inputs so the builders stay reproducible across retries.

pub mod entities;
pub mod jwt;
pub mod retail;
pub mod security_code;
pub mod soap;
pub mod wholesale;
pub mod xmldsig;
