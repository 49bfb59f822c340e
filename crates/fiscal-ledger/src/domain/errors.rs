//! Ledger error taxonomy.

use fiscal_types::RequestStatus;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A state move not allowed by the request state machine.
    #[error("invalid transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("fiscal document {0} not found")]
    DocumentNotFound(Uuid),

    #[error("fiscal request {0} not found")]
    RequestNotFound(Uuid),

    /// A non-released request already exists under the same idempotency key.
    #[error("duplicate request for idempotency key {idempotency_key}")]
    DuplicateRequest { idempotency_key: String },

    /// Another request for the same document has not reached a terminal
    /// state yet.
    #[error("document {document_id} already has an in-flight request")]
    RequestInFlight { document_id: Uuid },
}
