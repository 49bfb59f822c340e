//! # Ledger Port
//!
//! The single seam through which the dispatcher (and its workers) touch
//! persistent state. Implementations must make `new_request` and
//! `record_outcome` atomic: the in-memory adapter does so under one lock,
//! a database adapter would use a transaction.
//!
//! Timestamps are passed in by callers so the ledger itself stays clock-free
//! and attempt times remain deterministic in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fiscal_types::{BuiltPayload, DocumentType, ParsedResponse, RequestStatus};
use uuid::Uuid;

use crate::domain::entities::{FiscalDocument, FiscalRequest, FiscalResponse};
use crate::domain::errors::LedgerError;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Get-or-create the document row for `(tenant, type, id)`.
    async fn open_document(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
        document_id: &str,
        now: DateTime<Utc>,
    ) -> FiscalDocument;

    /// Creates a queued request under `idempotency_key` and moves the parent
    /// document to `enqueued`.
    ///
    /// Fails with [`LedgerError::DuplicateRequest`] while another request
    /// holds the key, unless that request ended in a terminal failure; fails
    /// with [`LedgerError::RequestInFlight`] while any other request for the
    /// same document is non-terminal (single-flight per document).
    async fn new_request(
        &self,
        document_id: Uuid,
        payload: BuiltPayload,
        idempotency_key: &str,
        now: DateTime<Utc>,
    ) -> Result<FiscalRequest, LedgerError>;

    /// The request currently holding `idempotency_key`, if any.
    async fn find_active_request(&self, idempotency_key: &str) -> Option<FiscalRequest>;

    /// Marks the start of one send attempt: bumps `attempt_count` and
    /// stamps `last_attempt_at`.
    async fn begin_attempt(
        &self,
        request_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<FiscalRequest, LedgerError>;

    /// Appends a response row to the request's attempt history.
    async fn attach_response(
        &self,
        request_id: Uuid,
        raw: String,
        parsed: ParsedResponse,
        now: DateTime<Utc>,
    ) -> Result<FiscalResponse, LedgerError>;

    /// Moves the request to `to`, validating against the transition table,
    /// and reconciles the parent document's aggregate status.
    async fn transition(
        &self,
        request_id: Uuid,
        to: RequestStatus,
    ) -> Result<FiscalRequest, LedgerError>;

    /// Atomic `attach_response` + `transition` covering one attempt outcome.
    async fn record_outcome(
        &self,
        request_id: Uuid,
        raw: String,
        parsed: ParsedResponse,
        to: RequestStatus,
        now: DateTime<Utc>,
    ) -> Result<FiscalRequest, LedgerError>;

    async fn document(&self, id: Uuid) -> Option<FiscalDocument>;

    async fn request(&self, id: Uuid) -> Option<FiscalRequest>;

    /// All requests created under a document, oldest first.
    async fn requests_for_document(&self, document_id: Uuid) -> Vec<FiscalRequest>;

    /// Attempt history for a request, oldest first.
    async fn responses(&self, request_id: Uuid) -> Vec<FiscalResponse>;
}
