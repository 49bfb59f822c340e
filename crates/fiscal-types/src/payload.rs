//! # Built Payload Snapshots
//!
//! The output of a payload builder, frozen onto the `FiscalRequest` at
//! creation time. Retries sign and send the stored snapshot rather than
//! rebuilding, which keeps the F1 security code byte-identical across
//! attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fiscalization regime a document was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Retail: XML request, SOAP transport, X.509 signing.
    RetailF1,
    /// Wholesale: JSON request, HTTP transport, optional bearer token.
    WholesaleF2,
}

impl Regime {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RetailF1 => "f1",
            Self::WholesaleF2 => "f2",
        }
    }
}

/// A built wire payload, ready for the signing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "regime", rename_all = "snake_case")]
pub enum BuiltPayload {
    /// Canonical F1 `RacunZahtjev` document.
    Retail {
        /// UTF-8 XML text, including the declaration.
        xml: String,
        /// `Id` attribute of the root element; the signature reference URI.
        root_id: String,
        /// Derived `ZastKod` embedded in the document.
        security_code: String,
        /// Invoice datetime frozen at request creation.
        timestamp: DateTime<Utc>,
    },
    /// F2 JSON request body.
    Wholesale { body: serde_json::Value },
}

impl BuiltPayload {
    pub fn regime(&self) -> Regime {
        match self {
            Self::Retail { .. } => Regime::RetailF1,
            Self::Wholesale { .. } => Regime::WholesaleF2,
        }
    }
}
