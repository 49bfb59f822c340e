//! # Fiscal Types Crate
//!
//! Domain entities shared across the fiscalization gateway, ledger, and
//! dispatcher crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a crate boundary is
//!   defined here.
//! - **Frozen invoice view**: the gateway consumes an immutable snapshot of
//!   the business document; it never reaches back into the owning
//!   application.
//! - **Decimal money**: all monetary values are `rust_decimal::Decimal`;
//!   floating point never enters payload construction or the security-code
//!   input.

pub mod amounts;
pub mod errors;
pub mod idempotency;
pub mod invoice;
pub mod payload;
pub mod response;
pub mod status;
pub mod tenant;

pub use amounts::{format_amount, two_dp};
pub use errors::FiscalError;
pub use idempotency::idempotency_key;
pub use invoice::{
    BuyerKind, InvoiceLine, InvoiceView, NumberTriple, PartyInfo, PaymentMethod, SalesChannel,
    Totals, VatBucket,
};
pub use payload::{BuiltPayload, Regime};
pub use response::ParsedResponse;
pub use status::{DocumentStatus, DocumentType, FiscalStatus, RequestStatus};
pub use tenant::{CertificateMaterial, Mode, RegimeSelector, TenantConfig};
