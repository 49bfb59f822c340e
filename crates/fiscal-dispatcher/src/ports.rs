//! # Dispatcher Ports
//!
//! Contracts toward the surrounding application: configuration lookup and
//! the invoice status write-back.

use async_trait::async_trait;
use fiscal_types::{FiscalStatus, TenantConfig};

/// Read-only tenant configuration source.
///
/// Workers call this on every attempt rather than caching, so operator
/// edits (rotated certificates, changed endpoints) take effect on the next
/// use.
#[async_trait]
pub trait TenantConfigStore: Send + Sync {
    async fn config_for(&self, tenant_id: &str) -> Option<TenantConfig>;
}

/// Conditional write-back of `fiscal_status` / `fiscal_id` onto the invoice
/// record.
///
/// Implementations MUST NOT re-enter the dispatcher: this call replaces the
/// sentinel-attribute recursion guard that a save-hook architecture needs.
/// The update is fire-and-forget from the core's perspective.
#[async_trait]
pub trait InvoiceStatusSink: Send + Sync {
    async fn update_status(
        &self,
        tenant_id: &str,
        invoice_id: &str,
        status: FiscalStatus,
        fiscal_id: Option<String>,
    );
}
