//! # Lifecycle Enumerations
//!
//! Status enums with explicit transition tables. State changes in the ledger
//! go through a single validated `transition` helper; these types define
//! which moves are legal.
//!
//! ```text
//! queued --(send attempt, ok)--> sent          [terminal-success]
//! queued --(remote reject)-----> failed        [terminal-failure]
//! queued --(transport error)---> error --(backoff elapsed)--> queued
//! ```

use serde::{Deserialize, Serialize};

/// Kind of business document tracked by the ledger.
///
/// The core only fiscalizes invoices today; the enum keeps the ledger schema
/// open for other document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
}

impl DocumentType {
    /// Stable textual form used in idempotency keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
        }
    }
}

/// Aggregate status of a `FiscalDocument`, a monotonic projection of its
/// latest request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Enqueued,
    Processed,
    Failed,
    Exempt,
}

impl DocumentStatus {
    /// Projects a request state onto the owning document.
    ///
    /// A request still in flight (queued or awaiting a backoff requeue) keeps
    /// the document enqueued; terminal request states map to terminal
    /// document states.
    pub fn projection_of(request: RequestStatus) -> Self {
        match request {
            RequestStatus::Queued | RequestStatus::Error => Self::Enqueued,
            RequestStatus::Sent => Self::Processed,
            RequestStatus::Failed => Self::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Processed | Self::Failed | Self::Exempt)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Enqueued => "enqueued",
            Self::Processed => "processed",
            Self::Failed => "failed",
            Self::Exempt => "exempt",
        }
    }
}

/// Status mirrored back onto the invoice record by the dispatcher.
///
/// Carries the same five values as [`DocumentStatus`]; the alias marks the
/// write-back surface in signatures.
pub type FiscalStatus = DocumentStatus;

/// Per-attempt status of a `FiscalRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Created, waiting for a worker.
    Queued,
    /// Provider acknowledged the submission. Terminal success.
    Sent,
    /// Provider returned a permanent rejection. Terminal unless an operator
    /// explicitly re-opens with a new request.
    Failed,
    /// Transport-level failure; eligible for a backoff requeue.
    Error,
}

impl RequestStatus {
    /// Whether the transition table permits `self -> next`.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Sent)
                | (Self::Queued, Self::Failed)
                | (Self::Queued, Self::Error)
                | (Self::Error, Self::Queued)
                | (Self::Error, Self::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}
