//! # Send Worker
//!
//! Drains `SendFiscalRequest` jobs and runs the attempt loop for each:
//! begin attempt, rebuild the adapter from fresh tenant configuration, sign
//! and ship the stored payload, record the outcome, and requeue with
//! backoff on transport-level failures.
//!
//! The stored payload is never rebuilt; the security code and the body are
//! byte-identical across attempts.

use std::sync::Arc;

use fiscal_types::{FiscalError, FiscalStatus, ParsedResponse, RequestStatus};
use fiscal_ledger::{FiscalDocument, FiscalRequest};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::dispatcher::{SendFiscalRequest, Shared};
use crate::router;

pub struct Worker {
    shared: Arc<Shared>,
    receiver: mpsc::Receiver<SendFiscalRequest>,
}

impl Worker {
    pub(crate) fn new(shared: Arc<Shared>, receiver: mpsc::Receiver<SendFiscalRequest>) -> Self {
        Self { shared, receiver }
    }

    /// Runs until the dispatcher side of the channel is dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.receiver.recv().await {
            process(&self.shared, job.request_id).await;
        }
    }
}

/// One attempt outcome, after classification.
enum AttemptResult {
    Delivered { raw: String, parsed: ParsedResponse },
    Rejected { raw: String, parsed: ParsedResponse },
    Retriable { raw: String, parsed: ParsedResponse },
    Terminal { parsed: ParsedResponse },
}

/// Runs the full attempt loop for one request, retries included.
pub(crate) async fn process(shared: &Shared, request_id: Uuid) {
    loop {
        let Some(request) = shared.ledger.request(request_id).await else {
            tracing::error!(%request_id, "job references unknown request");
            return;
        };
        if request.status != RequestStatus::Queued {
            tracing::debug!(%request_id, status = request.status.as_str(), "request not queued, skipping");
            return;
        }
        let Some(document) = shared.ledger.document(request.document_id).await else {
            tracing::error!(%request_id, "request has no parent document");
            return;
        };

        let request = match shared
            .ledger
            .begin_attempt(request_id, shared.clock.now())
            .await
        {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(%request_id, error = %e, "begin_attempt failed");
                return;
            }
        };
        tracing::info!(
            %request_id,
            attempt = request.attempt_count,
            tenant = %document.tenant_id,
            "sending fiscal request"
        );

        match attempt(shared, &document, &request).await {
            AttemptResult::Delivered { raw, parsed } => {
                let fiscal_id = parsed.fiscal_id.clone();
                record(shared, request_id, raw, parsed, RequestStatus::Sent).await;
                shared
                    .sink
                    .update_status(
                        &document.tenant_id,
                        &document.document_id,
                        FiscalStatus::Processed,
                        fiscal_id,
                    )
                    .await;
                return;
            }
            AttemptResult::Rejected { raw, parsed } => {
                tracing::warn!(
                    %request_id,
                    code = parsed.error_code.as_deref().unwrap_or("?"),
                    "provider rejected submission"
                );
                record(shared, request_id, raw, parsed, RequestStatus::Failed).await;
                mark_invoice_failed(shared, &document).await;
                return;
            }
            AttemptResult::Terminal { parsed } => {
                tracing::error!(
                    %request_id,
                    message = parsed.message.as_deref().unwrap_or("?"),
                    "submission failed permanently"
                );
                record(shared, request_id, String::new(), parsed, RequestStatus::Failed).await;
                mark_invoice_failed(shared, &document).await;
                return;
            }
            AttemptResult::Retriable { raw, parsed } => {
                record(shared, request_id, raw, parsed, RequestStatus::Error).await;
                if request.attempt_count >= shared.config.max_attempts {
                    tracing::error!(
                        %request_id,
                        attempts = request.attempt_count,
                        "retry budget exhausted"
                    );
                    transition(shared, request_id, RequestStatus::Failed).await;
                    mark_invoice_failed(shared, &document).await;
                    return;
                }
                let delay = shared.config.backoff_delay(request.attempt_count);
                tracing::info!(%request_id, delay_ms = delay.as_millis() as u64, "requeue after backoff");
                tokio::time::sleep(delay).await;
                transition(shared, request_id, RequestStatus::Queued).await;
            }
        }
    }
}

/// One sign-send-parse pass over the stored payload.
async fn attempt(
    shared: &Shared,
    document: &FiscalDocument,
    request: &FiscalRequest,
) -> AttemptResult {
    let Some(config) = shared.configs.config_for(&document.tenant_id).await else {
        return AttemptResult::Terminal {
            parsed: ParsedResponse::reject("config-error", "tenant configuration missing"),
        };
    };

    let route = router::route_for_regime(request.payload.regime(), &config);
    let adapter = match router::build_adapter(
        route,
        &config,
        shared.transport.clone(),
        shared.clock.clone(),
    ) {
        Ok(adapter) => adapter,
        Err(e) => return classify_error(e),
    };

    let signed = match adapter.sign_payload(&request.payload) {
        Ok(signed) => signed,
        Err(e) => return classify_error(e),
    };
    let raw = match adapter.send(&signed).await {
        Ok(raw) => raw,
        Err(e) => return classify_error(e),
    };
    let parsed = adapter.parse_response(&raw);

    if parsed.ok {
        AttemptResult::Delivered {
            raw: raw.body,
            parsed,
        }
    } else if is_parse_failure(&parsed) {
        // Malformed reply: retried like a transport error, logged apart.
        tracing::warn!(request = %request.id, "unparsable provider reply");
        AttemptResult::Retriable {
            raw: raw.body,
            parsed,
        }
    } else {
        AttemptResult::Rejected {
            raw: raw.body,
            parsed,
        }
    }
}

fn classify_error(error: FiscalError) -> AttemptResult {
    if error.is_retriable() {
        AttemptResult::Retriable {
            raw: String::new(),
            parsed: ParsedResponse::transport_error(&error),
        }
    } else {
        AttemptResult::Terminal {
            parsed: ParsedResponse::reject(error.kind(), error.to_string()),
        }
    }
}

fn is_parse_failure(parsed: &ParsedResponse) -> bool {
    parsed.error_code.is_none()
        && parsed
            .message
            .as_deref()
            .is_some_and(|message| message.starts_with("parse error"))
}

async fn record(
    shared: &Shared,
    request_id: Uuid,
    raw: String,
    parsed: ParsedResponse,
    to: RequestStatus,
) {
    if let Err(e) = shared
        .ledger
        .record_outcome(request_id, raw, parsed, to, shared.clock.now())
        .await
    {
        tracing::error!(%request_id, error = %e, "recording attempt outcome failed");
    }
}

async fn transition(shared: &Shared, request_id: Uuid, to: RequestStatus) {
    if let Err(e) = shared.ledger.transition(request_id, to).await {
        tracing::error!(%request_id, error = %e, "transition failed");
    }
}

async fn mark_invoice_failed(shared: &Shared, document: &FiscalDocument) {
    shared
        .sink
        .update_status(
            &document.tenant_id,
            &document.document_id,
            FiscalStatus::Failed,
            None,
        )
        .await;
}
