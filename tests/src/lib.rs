//! # Fiscal Gateway Test Suite
//!
//! Unified test crate covering the full submission pipeline.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support/          # Shared fixtures: invoices, tenant configs,
//! │                     # scripted transports, recording status sink
//! │
//! └── integration/      # End-to-end flows
//!     ├── scenarios.rs  # Happy paths, retries, rejects
//!     └── invariants.rs # Idempotency, routing stability, numeric
//!                       # fidelity, signature checks, sandbox isolation
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p fiscal-tests
//!
//! # By category
//! cargo test -p fiscal-tests integration::scenarios::
//! cargo test -p fiscal-tests integration::invariants::
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod support;
