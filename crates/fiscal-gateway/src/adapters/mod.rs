//! # Regime Adapters
//!
//! One adapter per wire regime, unified behind a variant type rather than a
//! trait object: the router picks the variant, callers match or use the
//! delegating methods below. All configuration is injected at construction;
//! adapters hold no mutable state.

pub mod http;
pub mod retail;
pub mod wholesale;

use chrono::{DateTime, Utc};
use fiscal_types::{BuiltPayload, FiscalError, InvoiceView, ParsedResponse, Regime};

pub use http::HttpTransport;
pub use retail::{RetailAdapter, SANDBOX_JIR};
pub use wholesale::{WholesaleAdapter, SANDBOX_FISCAL_ID};

use crate::domain::entities::{ConnectionTest, FiscalOutcome, RawResponse, SignedPayload};

/// The adapter selected by the router for one submission.
pub enum RegimeAdapter {
    Retail(RetailAdapter),
    Wholesale(WholesaleAdapter),
}

impl RegimeAdapter {
    pub fn regime(&self) -> Regime {
        match self {
            Self::Retail(_) => Regime::RetailF1,
            Self::Wholesale(_) => Regime::WholesaleF2,
        }
    }

    pub fn prepare_payload(
        &self,
        invoice: &InvoiceView,
        timestamp: DateTime<Utc>,
    ) -> Result<BuiltPayload, FiscalError> {
        match self {
            Self::Retail(adapter) => adapter.prepare_payload(invoice, timestamp),
            Self::Wholesale(adapter) => adapter.prepare_payload(invoice, timestamp),
        }
    }

    pub fn sign_payload(&self, payload: &BuiltPayload) -> Result<SignedPayload, FiscalError> {
        match self {
            Self::Retail(adapter) => adapter.sign_payload(payload),
            Self::Wholesale(adapter) => adapter.sign_payload(payload),
        }
    }

    pub async fn send(&self, signed: &SignedPayload) -> Result<RawResponse, FiscalError> {
        match self {
            Self::Retail(adapter) => adapter.send(signed).await,
            Self::Wholesale(adapter) => adapter.send(signed).await,
        }
    }

    pub fn parse_response(&self, raw: &RawResponse) -> ParsedResponse {
        match self {
            Self::Retail(adapter) => adapter.parse_response(raw),
            Self::Wholesale(adapter) => adapter.parse_response(raw),
        }
    }

    pub fn health_check(&self) -> bool {
        match self {
            Self::Retail(adapter) => adapter.health_check(),
            Self::Wholesale(adapter) => adapter.health_check(),
        }
    }

    pub async fn test_connection(&self) -> ConnectionTest {
        match self {
            Self::Retail(adapter) => adapter.test_connection().await,
            Self::Wholesale(adapter) => adapter.test_connection().await,
        }
    }

    /// Full pipeline: build, sign, send, parse.
    pub async fn fiscalize(&self, invoice: &InvoiceView) -> Result<FiscalOutcome, FiscalError> {
        match self {
            Self::Retail(adapter) => adapter.fiscalize(invoice).await,
            Self::Wholesale(adapter) => adapter.fiscalize(invoice).await,
        }
    }
}
