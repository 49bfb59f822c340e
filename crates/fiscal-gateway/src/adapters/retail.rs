//! # Retail (F1) Adapter
//!
//! Binds the XML builder, XML-DSig signer, SOAP wrapper, transport, and
//! response parser into one `fiscalize` pipeline. Construction is where the
//! production credential check happens; an adapter that exists is an adapter
//! that can sign.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fiscal_types::{BuiltPayload, FiscalError, InvoiceView, Mode, ParsedResponse, TenantConfig};
use serde_json::json;

use crate::domain::entities::{
    ConnectionTest, FiscalOutcome, RawResponse, SignedPayload, WireRequest,
};
use crate::domain::retail::ROOT_QNAME;
use crate::domain::security_code::CodeSigner;
use crate::domain::xmldsig::SignatureMaterial;
use crate::domain::{retail, soap, wholesale, xmldsig};
use crate::ports::outbound::{Clock, Transport};

/// Deterministic fiscal id returned by the sandbox stub.
pub const SANDBOX_JIR: &str = "V1-SANDBOX-JIR";

const CONTENT_TYPE_XML: &str = "text/xml; charset=utf-8";

pub struct RetailAdapter {
    config: TenantConfig,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    /// Present iff the tenant runs in production.
    material: Option<SignatureMaterial>,
}

impl std::fmt::Debug for RetailAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetailAdapter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetailAdapter {
    /// Builds the adapter, decoding credentials up front.
    ///
    /// Production without an active certificate or endpoint is a
    /// configuration error; unsigned submissions must never leave a
    /// production tenant.
    pub fn new(
        config: TenantConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FiscalError> {
        let material = match config.mode {
            Mode::Sandbox => None,
            Mode::Production => {
                let cert = config.active_certificate().ok_or_else(|| {
                    FiscalError::Config(format!(
                        "tenant {} has no active certificate for retail submissions",
                        config.tenant_id
                    ))
                })?;
                if config.endpoint.is_none() {
                    return Err(FiscalError::Config(format!(
                        "tenant {} has no retail endpoint configured",
                        config.tenant_id
                    )));
                }
                Some(SignatureMaterial::from_pem(&cert.key_pem, &cert.cert_pem)?)
            }
        };
        Ok(Self {
            config,
            transport,
            clock,
            material,
        })
    }

    fn is_sandbox(&self) -> bool {
        self.material.is_none()
    }

    /// Builds the F1 payload for the given submission timestamp.
    pub fn prepare_payload(
        &self,
        invoice: &InvoiceView,
        timestamp: DateTime<Utc>,
    ) -> Result<BuiltPayload, FiscalError> {
        let signer = match &self.material {
            Some(material) => CodeSigner::RsaKey(material.private_key()),
            None => CodeSigner::SandboxPlaceholder,
        };
        retail::build_request(
            invoice,
            self.config.operator_tax_id.as_deref(),
            timestamp,
            &signer,
        )
    }

    /// Signs (production) or passes through (sandbox), then SOAP-wraps.
    pub fn sign_payload(&self, payload: &BuiltPayload) -> Result<SignedPayload, FiscalError> {
        let BuiltPayload::Retail { xml, root_id, .. } = payload else {
            return Err(FiscalError::Build(
                "retail adapter received a wholesale payload".to_string(),
            ));
        };
        let document = match &self.material {
            Some(material) => xmldsig::sign_enveloped(xml, root_id, ROOT_QNAME, material)?,
            None => xml.clone(),
        };
        Ok(SignedPayload::SoapEnvelope {
            bytes: soap::wrap_envelope(&document).into_bytes(),
        })
    }

    /// Ships the envelope, or short-circuits to the sandbox stub.
    pub async fn send(&self, signed: &SignedPayload) -> Result<RawResponse, FiscalError> {
        let SignedPayload::SoapEnvelope { bytes } = signed else {
            return Err(FiscalError::Build(
                "retail adapter received a non-SOAP payload".to_string(),
            ));
        };
        match (&self.config.endpoint, self.is_sandbox()) {
            (Some(endpoint), false) => {
                self.transport
                    .send(WireRequest {
                        endpoint: endpoint.clone(),
                        content_type: CONTENT_TYPE_XML,
                        body: bytes.clone(),
                        bearer: None,
                    })
                    .await
            }
            _ => {
                tracing::debug!(tenant = %self.config.tenant_id, "retail sandbox stub response");
                Ok(RawResponse::new(
                    json!({
                        "status": "OK",
                        "message": "sandbox response",
                        "jir": SANDBOX_JIR,
                    })
                    .to_string(),
                ))
            }
        }
    }

    /// Normalizes a reply: SOAP bodies go through the `RacunOdgovor` parser,
    /// sandbox stubs are already-normalized JSON.
    pub fn parse_response(&self, raw: &RawResponse) -> ParsedResponse {
        if raw.body.trim_start().starts_with('<') {
            soap::parse_racun_odgovor(&raw.body)
        } else {
            wholesale::parse_response(&raw.body)
        }
    }

    pub fn health_check(&self) -> bool {
        self.is_sandbox() || self.config.endpoint.is_some()
    }

    /// Probes the channel without submitting an invoice.
    pub async fn test_connection(&self) -> ConnectionTest {
        if self.is_sandbox() {
            return ConnectionTest {
                success: true,
                message: "sandbox mode, no remote endpoint".to_string(),
            };
        }
        let Some(endpoint) = self.config.endpoint.clone() else {
            return ConnectionTest {
                success: false,
                message: "no endpoint configured".to_string(),
            };
        };
        let probe = soap::wrap_envelope(
            "<tns:EchoZahtjev xmlns:tns=\"http://www.apis-it.hr/fin/2012/types/f73\">ping</tns:EchoZahtjev>",
        );
        match self
            .transport
            .send(WireRequest {
                endpoint,
                content_type: CONTENT_TYPE_XML,
                body: probe.into_bytes(),
                bearer: None,
            })
            .await
        {
            Ok(_) => ConnectionTest {
                success: true,
                message: "endpoint reachable".to_string(),
            },
            Err(e) => ConnectionTest {
                success: false,
                message: e.to_string(),
            },
        }
    }

    /// Full pipeline: build, sign, send, parse.
    pub async fn fiscalize(&self, invoice: &InvoiceView) -> Result<FiscalOutcome, FiscalError> {
        let payload = self.prepare_payload(invoice, self.clock.now())?;
        let signed = self.sign_payload(&payload)?;
        let raw = self.send(&signed).await?;
        let parsed = self.parse_response(&raw);
        Ok(FiscalOutcome { raw, parsed })
    }
}
