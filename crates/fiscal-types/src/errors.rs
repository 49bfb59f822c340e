//! # Error Taxonomy
//!
//! Every failure in the submission pipeline maps to exactly one of these
//! kinds. The dispatcher never throws; it captures the error at the adapter
//! boundary, attaches it to the ledger, and transitions state. Only
//! transport-shaped failures are retriable.

use thiserror::Error;

/// Failure taxonomy of the fiscalization pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FiscalError {
    /// Missing or invalid credentials/endpoint in production. Terminal;
    /// surfaced to operators.
    #[error("configuration error: {0}")]
    Config(String),

    /// Document failed the dispatcher preconditions. Terminal until the
    /// business record is amended.
    #[error("validation error: {0}")]
    Validation(String),

    /// Payload could not be serialized. Terminal; indicates an upstream data
    /// bug.
    #[error("payload build error: {0}")]
    Build(String),

    /// Signing step failed (bad key, revoked certificate). Terminal; operator
    /// intervention required.
    #[error("signing error: {0}")]
    Signing(String),

    /// Network failure, timeout, or non-2xx with no parsable body. Retriable
    /// per the dispatcher backoff policy.
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider returned a parsable negative response. Terminal unless an
    /// operator re-opens the submission.
    #[error("remote reject {code}: {message}")]
    RemoteReject { code: String, message: String },

    /// Response body was malformed. Retried like a transport error but logged
    /// distinctly.
    #[error("parse error: {0}")]
    Parse(String),
}

impl FiscalError {
    /// Whether the dispatcher's retry policy applies.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Parse(_))
    }

    /// Stable short tag for logging and synthetic response rows.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Validation(_) => "validation",
            Self::Build(_) => "build",
            Self::Signing(_) => "signing",
            Self::Transport(_) => "transport",
            Self::RemoteReject { .. } => "remote_reject",
            Self::Parse(_) => "parse",
        }
    }
}
