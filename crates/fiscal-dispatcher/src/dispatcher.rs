//! # Dispatcher
//!
//! Reacts to business events, creates ledger entries, and schedules the
//! actual send on a background worker. The event callbacks are the inbound
//! boundary of the core: they validate, enqueue, and return; they never
//! block on the wire and never propagate errors to the caller.

use std::sync::Arc;

use fiscal_gateway::ports::outbound::{Clock, Transport};
use fiscal_types::{idempotency_key, DocumentType, FiscalStatus, InvoiceView};
use fiscal_ledger::{Ledger, LedgerError};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::DispatcherConfig;
use crate::ports::{InvoiceStatusSink, TenantConfigStore};
use crate::worker::{self, Worker};
use crate::router;

/// Typed job drained by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendFiscalRequest {
    pub request_id: Uuid,
}

/// Everything the dispatcher and its workers share.
pub(crate) struct Shared {
    pub(crate) ledger: Arc<dyn Ledger>,
    pub(crate) configs: Arc<dyn TenantConfigStore>,
    pub(crate) sink: Arc<dyn InvoiceStatusSink>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: DispatcherConfig,
}

pub struct Dispatcher {
    shared: Arc<Shared>,
    /// Job channel toward the worker; `None` runs sends inline, which is
    /// meant for tests and degraded single-threaded operation.
    queue: Option<mpsc::Sender<SendFiscalRequest>>,
}

impl Dispatcher {
    /// Dispatcher without a background worker: sends run inline on the
    /// calling task, retries included.
    pub fn new_inline(
        ledger: Arc<dyn Ledger>,
        configs: Arc<dyn TenantConfigStore>,
        sink: Arc<dyn InvoiceStatusSink>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                ledger,
                configs,
                sink,
                transport,
                clock,
                config,
            }),
            queue: None,
        }
    }

    /// Dispatcher plus the worker that drains its job channel. The caller
    /// spawns the worker (`tokio::spawn(worker.run())`).
    pub fn with_worker(
        ledger: Arc<dyn Ledger>,
        configs: Arc<dyn TenantConfigStore>,
        sink: Arc<dyn InvoiceStatusSink>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        config: DispatcherConfig,
        queue_depth: usize,
    ) -> (Self, Worker) {
        let (tx, rx) = mpsc::channel(queue_depth);
        let shared = Arc::new(Shared {
            ledger,
            configs,
            sink,
            transport,
            clock,
            config,
        });
        let worker = Worker::new(shared.clone(), rx);
        (
            Self {
                shared,
                queue: Some(tx),
            },
            worker,
        )
    }

    /// Invoice created on a fiscally relevant channel.
    pub async fn on_invoice_created(&self, invoice: &InvoiceView) {
        self.trigger(invoice).await;
    }

    /// Invoice transitioned to paid. The caller fires this only on the
    /// was-not-paid to now-paid edge; the ledger de-dups regardless.
    pub async fn on_invoice_paid(&self, invoice: &InvoiceView) {
        if !invoice.is_paid {
            tracing::warn!(invoice = %invoice.invoice_id, "paid event for unpaid invoice ignored");
            return;
        }
        self.trigger(invoice).await;
    }

    async fn trigger(&self, invoice: &InvoiceView) {
        if !invoice.sales_channel.is_fiscally_relevant() {
            self.shared
                .sink
                .update_status(
                    &invoice.tenant_id,
                    &invoice.invoice_id,
                    FiscalStatus::Exempt,
                    None,
                )
                .await;
            return;
        }

        if let Err(reason) = check_preconditions(invoice) {
            tracing::warn!(
                invoice = %invoice.invoice_id,
                reason,
                "invoice fails fiscalization preconditions"
            );
            self.mark_failed(invoice).await;
            return;
        }

        let Some(config) = self.shared.configs.config_for(&invoice.tenant_id).await else {
            tracing::error!(tenant = %invoice.tenant_id, "no tenant configuration");
            self.mark_failed(invoice).await;
            return;
        };

        let route = router::route(invoice, &config, self.shared.config.wholesale_threshold);
        let adapter = match router::build_adapter(
            route,
            &config,
            self.shared.transport.clone(),
            self.shared.clock.clone(),
        ) {
            Ok(adapter) => adapter,
            Err(e) => {
                tracing::error!(tenant = %invoice.tenant_id, error = %e, "adapter construction failed");
                self.mark_failed(invoice).await;
                return;
            }
        };

        // The submission timestamp is frozen here; retries re-use the stored
        // payload so the security code never drifts across attempts.
        let payload = match adapter.prepare_payload(invoice, self.shared.clock.now()) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(invoice = %invoice.invoice_id, error = %e, "payload build failed");
                self.mark_failed(invoice).await;
                return;
            }
        };

        let now = self.shared.clock.now();
        let document = self
            .shared
            .ledger
            .open_document(
                &invoice.tenant_id,
                DocumentType::Invoice,
                &invoice.invoice_id,
                now,
            )
            .await;
        let key = idempotency_key(
            &invoice.tenant_id,
            DocumentType::Invoice,
            &invoice.invoice_id,
            invoice.version,
        );
        let request = match self
            .shared
            .ledger
            .new_request(document.id, payload, &key, now)
            .await
        {
            Ok(request) => request,
            Err(LedgerError::DuplicateRequest { .. }) => {
                tracing::debug!(invoice = %invoice.invoice_id, "submission already tracked");
                return;
            }
            Err(LedgerError::RequestInFlight { .. }) => {
                tracing::debug!(
                    invoice = %invoice.invoice_id,
                    "document already has an in-flight submission"
                );
                return;
            }
            Err(e) => {
                tracing::error!(invoice = %invoice.invoice_id, error = %e, "ledger rejected request");
                self.mark_failed(invoice).await;
                return;
            }
        };

        self.shared
            .sink
            .update_status(
                &invoice.tenant_id,
                &invoice.invoice_id,
                FiscalStatus::Enqueued,
                None,
            )
            .await;

        let job = SendFiscalRequest {
            request_id: request.id,
        };
        match &self.queue {
            Some(queue) => {
                if queue.send(job).await.is_err() {
                    // Worker gone; degrade to inline so the request is not
                    // stranded in `queued`.
                    tracing::warn!("worker channel closed, sending inline");
                    worker::process(&self.shared, job.request_id).await;
                }
            }
            None => worker::process(&self.shared, job.request_id).await,
        }
    }

    async fn mark_failed(&self, invoice: &InvoiceView) {
        self.shared
            .sink
            .update_status(
                &invoice.tenant_id,
                &invoice.invoice_id,
                FiscalStatus::Failed,
                None,
            )
            .await;
    }
}

/// Precondition gate from the trigger path: issuer tax id, number, and at
/// least one line item must be present. Violations mark the invoice failed
/// without creating ledger rows.
fn check_preconditions(invoice: &InvoiceView) -> Result<(), &'static str> {
    if invoice.issuer.tax_id.trim().is_empty() {
        return Err("issuer has no tax id");
    }
    if invoice.number.trim().is_empty() {
        return Err("invoice has no number");
    }
    if invoice.lines.is_empty() {
        return Err("invoice has no line items");
    }
    Ok(())
}
