//! # In-Memory Ledger
//!
//! Reference implementation of the [`Ledger`] port. Every operation takes
//! the write lock once and completes under it, which gives the same
//! atomicity a database transaction would: `record_outcome` either appends
//! the response row and moves the request, or does neither.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fiscal_types::{BuiltPayload, DocumentStatus, DocumentType, ParsedResponse, RequestStatus};
use uuid::Uuid;

use crate::domain::entities::{FiscalDocument, FiscalRequest, FiscalResponse};
use crate::domain::errors::LedgerError;
use crate::ports::Ledger;

#[derive(Default)]
struct Inner {
    documents: HashMap<Uuid, FiscalDocument>,
    /// `(tenant, type, business id)` -> document row.
    document_index: HashMap<(String, DocumentType, String), Uuid>,
    requests: HashMap<Uuid, FiscalRequest>,
    /// Idempotency key -> requests created under it, in creation order.
    key_index: HashMap<String, Vec<Uuid>>,
    /// Document -> requests created under it, in creation order.
    document_requests: HashMap<Uuid, Vec<Uuid>>,
    responses: HashMap<Uuid, Vec<FiscalResponse>>,
}

impl Inner {
    fn apply_transition(
        &mut self,
        request_id: Uuid,
        to: RequestStatus,
    ) -> Result<FiscalRequest, LedgerError> {
        let request = self
            .requests
            .get_mut(&request_id)
            .ok_or(LedgerError::RequestNotFound(request_id))?;
        if !request.status.can_transition_to(to) {
            return Err(LedgerError::InvalidTransition {
                from: request.status,
                to,
            });
        }
        request.status = to;
        let request = request.clone();

        // Reconcile the parent aggregate. Processed is sticky: a document
        // fiscalized once never regresses.
        if let Some(document) = self.documents.get_mut(&request.document_id) {
            if document.status != DocumentStatus::Processed {
                document.status = DocumentStatus::projection_of(to);
            }
        }
        Ok(request)
    }

    fn push_response(
        &mut self,
        request_id: Uuid,
        raw: String,
        parsed: ParsedResponse,
        now: DateTime<Utc>,
    ) -> Result<FiscalResponse, LedgerError> {
        if !self.requests.contains_key(&request_id) {
            return Err(LedgerError::RequestNotFound(request_id));
        }
        let response = FiscalResponse {
            id: Uuid::new_v4(),
            request_id,
            raw,
            parsed,
            received_at: now,
        };
        self.responses
            .entry(request_id)
            .or_default()
            .push(response.clone());
        Ok(response)
    }
}

#[derive(Default)]
pub struct InMemoryLedger {
    inner: RwLock<Inner>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        // Lock poisoning only happens after a panic in another accessor;
        // the stored data is still consistent because every write completes
        // under one acquisition.
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn open_document(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
        document_id: &str,
        now: DateTime<Utc>,
    ) -> FiscalDocument {
        let mut inner = self.write();
        let key = (
            tenant_id.to_string(),
            document_type,
            document_id.to_string(),
        );
        if let Some(id) = inner.document_index.get(&key) {
            if let Some(existing) = inner.documents.get(id) {
                return existing.clone();
            }
        }
        let document = FiscalDocument::new(tenant_id, document_type, document_id, now);
        inner.document_index.insert(key, document.id);
        inner.documents.insert(document.id, document.clone());
        tracing::debug!(tenant = tenant_id, document = document_id, "opened fiscal document");
        document
    }

    async fn new_request(
        &self,
        document_id: Uuid,
        payload: BuiltPayload,
        idempotency_key: &str,
        now: DateTime<Utc>,
    ) -> Result<FiscalRequest, LedgerError> {
        let mut inner = self.write();
        if !inner.documents.contains_key(&document_id) {
            return Err(LedgerError::DocumentNotFound(document_id));
        }
        if let Some(existing_ids) = inner.key_index.get(idempotency_key) {
            let key_held = existing_ids
                .iter()
                .filter_map(|id| inner.requests.get(id))
                .any(|request| !request.releases_key());
            if key_held {
                return Err(LedgerError::DuplicateRequest {
                    idempotency_key: idempotency_key.to_string(),
                });
            }
        }
        // Single-flight per document: a second key (version bump) must wait
        // until the current request reaches a terminal state.
        let in_flight = inner
            .document_requests
            .get(&document_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.requests.get(id))
            .any(|request| !request.status.is_terminal());
        if in_flight {
            return Err(LedgerError::RequestInFlight { document_id });
        }
        let request = FiscalRequest::new(document_id, idempotency_key, payload, now);
        inner
            .key_index
            .entry(idempotency_key.to_string())
            .or_default()
            .push(request.id);
        inner
            .document_requests
            .entry(document_id)
            .or_default()
            .push(request.id);
        inner.requests.insert(request.id, request.clone());
        // The aggregate tracks its latest request from creation on, so the
        // document reads `enqueued` for the whole queue delay.
        if let Some(document) = inner.documents.get_mut(&document_id) {
            if document.status != DocumentStatus::Processed {
                document.status = DocumentStatus::projection_of(RequestStatus::Queued);
            }
        }
        Ok(request)
    }

    async fn find_active_request(&self, idempotency_key: &str) -> Option<FiscalRequest> {
        let inner = self.read();
        inner
            .key_index
            .get(idempotency_key)?
            .iter()
            .filter_map(|id| inner.requests.get(id))
            .find(|request| !request.releases_key())
            .cloned()
    }

    async fn begin_attempt(
        &self,
        request_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<FiscalRequest, LedgerError> {
        let mut inner = self.write();
        let request = inner
            .requests
            .get_mut(&request_id)
            .ok_or(LedgerError::RequestNotFound(request_id))?;
        request.attempt_count += 1;
        request.last_attempt_at = Some(now);
        Ok(request.clone())
    }

    async fn attach_response(
        &self,
        request_id: Uuid,
        raw: String,
        parsed: ParsedResponse,
        now: DateTime<Utc>,
    ) -> Result<FiscalResponse, LedgerError> {
        self.write().push_response(request_id, raw, parsed, now)
    }

    async fn transition(
        &self,
        request_id: Uuid,
        to: RequestStatus,
    ) -> Result<FiscalRequest, LedgerError> {
        self.write().apply_transition(request_id, to)
    }

    async fn record_outcome(
        &self,
        request_id: Uuid,
        raw: String,
        parsed: ParsedResponse,
        to: RequestStatus,
        now: DateTime<Utc>,
    ) -> Result<FiscalRequest, LedgerError> {
        let mut inner = self.write();
        // Validate the move before touching the history so a rejected
        // transition leaves no orphan response row.
        let current = inner
            .requests
            .get(&request_id)
            .ok_or(LedgerError::RequestNotFound(request_id))?
            .status;
        if !current.can_transition_to(to) {
            return Err(LedgerError::InvalidTransition { from: current, to });
        }
        inner.push_response(request_id, raw, parsed, now)?;
        inner.apply_transition(request_id, to)
    }

    async fn document(&self, id: Uuid) -> Option<FiscalDocument> {
        self.read().documents.get(&id).cloned()
    }

    async fn request(&self, id: Uuid) -> Option<FiscalRequest> {
        self.read().requests.get(&id).cloned()
    }

    async fn requests_for_document(&self, document_id: Uuid) -> Vec<FiscalRequest> {
        let inner = self.read();
        inner
            .document_requests
            .get(&document_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.requests.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn responses(&self, request_id: Uuid) -> Vec<FiscalResponse> {
        self.read()
            .responses
            .get(&request_id)
            .cloned()
            .unwrap_or_default()
    }
}
