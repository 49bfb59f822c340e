//! # Wholesale (F2) Adapter
//!
//! JSON body, optional HS256 bearer token, plain HTTP POST. The token is
//! minted at send-preparation time so its `iat` reflects the actual
//! submission, not the payload build.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fiscal_types::{BuiltPayload, FiscalError, InvoiceView, Mode, ParsedResponse, TenantConfig};
use serde_json::json;

use crate::domain::entities::{
    ConnectionTest, FiscalOutcome, RawResponse, SignedPayload, WireRequest,
};
use crate::domain::{jwt, wholesale};
use crate::ports::outbound::{Clock, Transport};

/// Deterministic fiscal id returned by the sandbox stub.
pub const SANDBOX_FISCAL_ID: &str = "V2-SANDBOX";

const CONTENT_TYPE_JSON: &str = "application/json";

pub struct WholesaleAdapter {
    config: TenantConfig,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for WholesaleAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WholesaleAdapter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WholesaleAdapter {
    /// Builds the adapter. Production requires an endpoint; the shared
    /// secret stays optional, an unsecreted tenant submits without a token.
    pub fn new(
        config: TenantConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FiscalError> {
        if config.mode == Mode::Production && config.endpoint.is_none() {
            return Err(FiscalError::Config(format!(
                "tenant {} has no wholesale endpoint configured",
                config.tenant_id
            )));
        }
        Ok(Self {
            config,
            transport,
            clock,
        })
    }

    fn is_sandbox(&self) -> bool {
        self.config.mode == Mode::Sandbox
    }

    /// Builds the F2 body for the given submission timestamp.
    pub fn prepare_payload(
        &self,
        invoice: &InvoiceView,
        timestamp: DateTime<Utc>,
    ) -> Result<BuiltPayload, FiscalError> {
        wholesale::build_request(invoice, self.config.operator_tax_id.as_deref(), timestamp)
    }

    /// Attaches a bearer token when a shared secret is configured.
    ///
    /// Sandbox tenants always pass through unsigned.
    pub fn sign_payload(&self, payload: &BuiltPayload) -> Result<SignedPayload, FiscalError> {
        let BuiltPayload::Wholesale { body } = payload else {
            return Err(FiscalError::Build(
                "wholesale adapter received a retail payload".to_string(),
            ));
        };
        let token = match (&self.config.shared_secret, self.is_sandbox()) {
            (Some(secret), false) => Some(jwt::issue_token(body, secret, self.clock.now())?),
            _ => None,
        };
        Ok(SignedPayload::BearerJson {
            body: body.clone(),
            token,
        })
    }

    /// Ships the body, or short-circuits to the sandbox stub.
    pub async fn send(&self, signed: &SignedPayload) -> Result<RawResponse, FiscalError> {
        let SignedPayload::BearerJson { body, token } = signed else {
            return Err(FiscalError::Build(
                "wholesale adapter received a SOAP payload".to_string(),
            ));
        };
        match (&self.config.endpoint, self.is_sandbox()) {
            (Some(endpoint), false) => {
                let bytes = serde_json::to_vec(body)
                    .map_err(|e| FiscalError::Build(format!("body serialize: {e}")))?;
                self.transport
                    .send(WireRequest {
                        endpoint: endpoint.clone(),
                        content_type: CONTENT_TYPE_JSON,
                        body: bytes,
                        bearer: token.clone(),
                    })
                    .await
            }
            _ => {
                tracing::debug!(tenant = %self.config.tenant_id, "wholesale sandbox stub response");
                Ok(RawResponse::new(
                    json!({
                        "status": "OK",
                        "message": "sandbox response",
                        "fiscal_id": SANDBOX_FISCAL_ID,
                    })
                    .to_string(),
                ))
            }
        }
    }

    pub fn parse_response(&self, raw: &RawResponse) -> ParsedResponse {
        wholesale::parse_response(&raw.body)
    }

    pub fn health_check(&self) -> bool {
        self.is_sandbox() || self.config.endpoint.is_some()
    }

    /// Probes the channel with a minimal ping document.
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
        let probe = json!({"version": wholesale::F2_VERSION, "documentType": "ping"});
        let token = match &self.config.shared_secret {
            Some(secret) => match jwt::issue_token(&probe, secret, self.clock.now()) {
                Ok(token) => Some(token),
                Err(e) => {
                    return ConnectionTest {
                        success: false,
                        message: e.to_string(),
                    }
                }
            },
            None => None,
        };
        match self
            .transport
            .send(WireRequest {
                endpoint,
                content_type: CONTENT_TYPE_JSON,
                body: probe.to_string().into_bytes(),
                bearer: token,
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
