//! # Tenant Configuration
//!
//! Per-tenant fiscalization settings. Owned by operator tooling; the core
//! reads this on every routing decision and never mutates it. Workers re-read
//! the configuration on each attempt, so operator edits take effect on the
//! next use without any cache invalidation protocol.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::payload::Regime;

/// Environment mode of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Sandbox,
    Production,
}

/// Operator-controlled regime selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeSelector {
    /// Classify by buyer kind and total (the normal path).
    #[default]
    Auto,
    ForceF1,
    ForceF2,
    /// Never send to a real endpoint regardless of mode.
    SandboxOnly,
}

/// X.509 credential material for F1 signing.
///
/// Cert and key are carried as PEM blobs; whether they came from the
/// filesystem or a secret store is opaque to the core. At most one active
/// certificate per tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateMaterial {
    pub owner: String,
    pub cert_pem: String,
    pub key_pem: String,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub active: bool,
}

/// Per-tenant fiscalization configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantConfig {
    pub tenant_id: String,
    #[serde(default)]
    pub selector: RegimeSelector,
    pub mode: Mode,
    /// Production endpoint URL; ignored in sandbox.
    pub endpoint: Option<String>,
    /// F1 signing credentials.
    pub certificate: Option<CertificateMaterial>,
    /// F2 shared secret for HS256 bearer tokens.
    pub shared_secret: Option<String>,
    /// Operator OIB recorded on F1 requests when the invoice carries none.
    pub operator_tax_id: Option<String>,
    /// Free-form operator metadata.
    #[serde(default)]
    pub meta: HashMap<String, String>,
}

impl TenantConfig {
    /// Minimal sandbox configuration, as used by tests and onboarding.
    pub fn sandbox(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            selector: RegimeSelector::Auto,
            mode: Mode::Sandbox,
            endpoint: None,
            certificate: None,
            shared_secret: None,
            operator_tax_id: None,
            meta: HashMap::new(),
        }
    }

    /// The active certificate, if any.
    pub fn active_certificate(&self) -> Option<&CertificateMaterial> {
        self.certificate.as_ref().filter(|cert| cert.active)
    }

    /// Completeness check for production use of a regime.
    ///
    /// Sandbox tenants are always considered configured. F1 needs an active
    /// certificate; F2 needs a shared secret and an endpoint.
    pub fn is_configured_for(&self, regime: Regime) -> bool {
        if self.mode == Mode::Sandbox {
            return true;
        }
        match regime {
            Regime::RetailF1 => self.active_certificate().is_some() && self.endpoint.is_some(),
            Regime::WholesaleF2 => self.shared_secret.is_some() && self.endpoint.is_some(),
        }
    }
}
