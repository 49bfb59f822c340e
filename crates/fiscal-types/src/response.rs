//! Regime-neutral parsed provider response.

use serde::{Deserialize, Serialize};

/// Normalized result of one provider reply, regardless of regime.
///
/// Both response parsers and the sandbox stubs produce this shape; the ledger
/// stores it verbatim next to the raw body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResponse {
    pub ok: bool,
    /// Authoritative receipt identifier (JIR for F1) on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiscal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ParsedResponse {
    pub fn success(fiscal_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            fiscal_id: Some(fiscal_id.into()),
            error_code: None,
            message: Some(message.into()),
        }
    }

    pub fn reject(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            fiscal_id: None,
            error_code: Some(error_code.into()),
            message: Some(message.into()),
        }
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self {
            ok: false,
            fiscal_id: None,
            error_code: None,
            message: Some(format!("parse error: {detail}")),
        }
    }

    /// Synthetic row recorded when a transport attempt produced no reply at
    /// all, keeping the attempt history reconstructible.
    pub fn transport_error(detail: impl std::fmt::Display) -> Self {
        Self {
            ok: false,
            fiscal_id: None,
            error_code: Some("transport-error".to_string()),
            message: Some(detail.to_string()),
        }
    }
}
