//! Value objects flowing between the adapter stages.

use fiscal_types::ParsedResponse;
use serde::{Deserialize, Serialize};

/// A signed/authenticated payload, ready for transport.
#[derive(Debug, Clone, PartialEq)]
pub enum SignedPayload {
    /// F1: SOAP envelope bytes (signed in production, plain in sandbox).
    SoapEnvelope { bytes: Vec<u8> },
    /// F2: JSON body plus an optional HS256 bearer token.
    BearerJson {
        body: serde_json::Value,
        token: Option<String>,
    },
}

/// One outbound HTTP request as handed to the transport port.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub endpoint: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Bearer token for the `Authorization` header, when present.
    pub bearer: Option<String>,
}

/// Raw provider reply as received off the wire (or from a sandbox stub).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub body: String,
}

impl RawResponse {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

/// Result of one full adapter pipeline run.
#[derive(Debug, Clone)]
pub struct FiscalOutcome {
    pub raw: RawResponse,
    pub parsed: ParsedResponse,
}

/// Report produced by `test_connection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTest {
    pub success: bool,
    pub message: String,
}
