//! # Ledger Entities
//!
//! Rows owned by the ledger. Created only through [`crate::ports::Ledger`]
//! operations; the surrounding application reads them but never writes.

use chrono::{DateTime, Utc};
use fiscal_types::{BuiltPayload, DocumentStatus, DocumentType, ParsedResponse, RequestStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Root row tying one submission effort to one business document.
///
/// Exactly one exists per `(tenant_id, document_type, document_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalDocument {
    pub id: Uuid,
    pub tenant_id: String,
    pub document_type: DocumentType,
    /// Business identifier of the underlying document.
    pub document_id: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
}

impl FiscalDocument {
    pub fn new(
        tenant_id: impl Into<String>,
        document_type: DocumentType,
        document_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            document_type,
            document_id: document_id.into(),
            status: DocumentStatus::Pending,
            created_at,
        }
    }
}

/// One logical submission plan.
///
/// The payload snapshot is frozen at creation; retries re-sign and re-send
/// these exact bytes, never a rebuild. The idempotency key stays stable
/// across retries of the same logical submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalRequest {
    pub id: Uuid,
    /// Owning [`FiscalDocument`].
    pub document_id: Uuid,
    pub idempotency_key: String,
    pub payload: BuiltPayload,
    pub attempt_count: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl FiscalRequest {
    pub fn new(
        document_id: Uuid,
        idempotency_key: impl Into<String>,
        payload: BuiltPayload,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            idempotency_key: idempotency_key.into(),
            payload,
            attempt_count: 0,
            last_attempt_at: None,
            status: RequestStatus::Queued,
            created_at,
        }
    }

    /// Whether a new request under the same idempotency key may be created.
    ///
    /// Only a terminal failure releases the key; anything else still counts
    /// as in flight or already delivered.
    pub fn releases_key(&self) -> bool {
        self.status == RequestStatus::Failed
    }
}

/// One received reply (or synthetic transport-error entry) for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalResponse {
    pub id: Uuid,
    /// Owning [`FiscalRequest`].
    pub request_id: Uuid,
    pub raw: String,
    pub parsed: ParsedResponse,
    pub received_at: DateTime<Utc>,
}
