//! Shared fixtures for the integration suite: invoices, tenant
//! configurations, scripted transports, and a recording status sink.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fiscal_dispatcher::{Dispatcher, DispatcherConfig, InvoiceStatusSink, TenantConfigStore};
use fiscal_gateway::ports::outbound::{Clock, FixedClock, Transport};
use fiscal_gateway::{RawResponse, WireRequest};
use fiscal_ledger::InMemoryLedger;
use fiscal_types::{
    BuyerKind, CertificateMaterial, FiscalError, FiscalStatus, InvoiceLine, InvoiceView, Mode,
    PartyInfo, PaymentMethod, SalesChannel, TenantConfig,
};
use rust_decimal::Decimal;

/// Throwaway RSA key/cert pair used across signing tests.
pub const TEST_KEY_PEM: &str = include_str!("../../fixtures/test_key.pem");
pub const TEST_CERT_PEM: &str = include_str!("../../fixtures/test_cert.pem");

pub const SELLER_OIB: &str = "12345678901";
pub const BUYER_OIB: &str = "98765432109";

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// Installs the log subscriber once; later calls are no-ops.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn frozen_instant() -> DateTime<Utc> {
    "2025-12-26T10:30:00Z".parse().unwrap()
}

pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(frozen_instant()))
}

// =============================================================================
// INVOICE FIXTURES
// =============================================================================

fn seller() -> PartyInfo {
    PartyInfo {
        tax_id: SELLER_OIB.to_string(),
        name: "Test d.o.o.".to_string(),
        address: "Ilica 1".to_string(),
        city: "Zagreb".to_string(),
        postal_code: "10000".to_string(),
        vat_id: Some(format!("HR{SELLER_OIB}")),
    }
}

pub fn line(rate: &str, base: &str, vat: &str) -> InvoiceLine {
    InvoiceLine {
        name: "Item".to_string(),
        quantity: Decimal::ONE,
        unit_price: dec(base),
        discount: Decimal::ZERO,
        rebate: Decimal::ZERO,
        vat_rate: dec(rate),
        base_amount: dec(base),
        vat_amount: dec(vat),
        total_amount: dec(base) + dec(vat),
    }
}

/// S1 shape: cash retail sale, number `1/POS1/DEV1`, 100.00 at 25% VAT.
pub fn retail_invoice() -> InvoiceView {
    InvoiceView {
        tenant_id: "t-1".to_string(),
        invoice_id: "inv-1".to_string(),
        number: "1/POS1/DEV1".to_string(),
        issue_date: NaiveDate::from_ymd_opt(2025, 12, 26).unwrap(),
        due_date: None,
        buyer_kind: BuyerKind::NaturalPerson,
        payment_method: PaymentMethod::Cash,
        sales_channel: SalesChannel::Retail,
        issuer: seller(),
        buyer: None,
        operator_tax_id: None,
        location_tag: "POS1".to_string(),
        device_tag: "DEV1".to_string(),
        notes: None,
        is_paid: false,
        payment_date: None,
        version: 1,
        lines: vec![line("25.00", "100.00", "25.00")],
    }
}

/// S2 shape: legal-entity buyer, 200.00 at 13% VAT.
pub fn wholesale_invoice() -> InvoiceView {
    InvoiceView {
        tenant_id: "t-1".to_string(),
        invoice_id: "inv-2".to_string(),
        number: "42/VP/1".to_string(),
        issue_date: NaiveDate::from_ymd_opt(2025, 12, 26).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2026, 1, 10),
        buyer_kind: BuyerKind::LegalEntity,
        payment_method: PaymentMethod::BankTransfer,
        sales_channel: SalesChannel::Wholesale,
        issuer: seller(),
        buyer: Some(PartyInfo {
            tax_id: BUYER_OIB.to_string(),
            name: "Kupac d.d.".to_string(),
            address: "Riva 2".to_string(),
            city: "Split".to_string(),
            postal_code: "21000".to_string(),
            vat_id: None,
        }),
        operator_tax_id: None,
        location_tag: "VP".to_string(),
        device_tag: "1".to_string(),
        notes: None,
        is_paid: false,
        payment_date: None,
        version: 1,
        lines: vec![line("13.00", "200.00", "26.00")],
    }
}

// =============================================================================
// TENANT CONFIGURATIONS
// =============================================================================

pub fn sandbox_config() -> TenantConfig {
    TenantConfig::sandbox("t-1")
}

pub fn production_f1_config() -> TenantConfig {
    let mut config = TenantConfig::sandbox("t-1");
    config.mode = Mode::Production;
    config.endpoint = Some("https://cis.example/racuni".to_string());
    config.certificate = Some(CertificateMaterial {
        owner: "t-1".to_string(),
        cert_pem: TEST_CERT_PEM.to_string(),
        key_pem: TEST_KEY_PEM.to_string(),
        valid_from: None,
        valid_to: None,
        active: true,
    });
    config
}

pub fn production_f2_config() -> TenantConfig {
    let mut config = TenantConfig::sandbox("t-1");
    config.mode = Mode::Production;
    config.endpoint = Some("https://provider.example/v2".to_string());
    config.shared_secret = Some("s3cret".to_string());
    config
}

/// Fixed-map configuration store.
pub struct StaticConfigStore {
    configs: HashMap<String, TenantConfig>,
}

impl StaticConfigStore {
    pub fn single(config: TenantConfig) -> Arc<Self> {
        let mut configs = HashMap::new();
        configs.insert(config.tenant_id.clone(), config);
        Arc::new(Self { configs })
    }
}

#[async_trait]
impl TenantConfigStore for StaticConfigStore {
    async fn config_for(&self, tenant_id: &str) -> Option<TenantConfig> {
        self.configs.get(tenant_id).cloned()
    }
}

// =============================================================================
// STATUS SINK
// =============================================================================

/// Records every write-back; panics are impossible, re-entry is structural
/// (it holds no dispatcher handle).
#[derive(Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<(String, FiscalStatus, Option<String>)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn last_for(&self, invoice_id: &str) -> Option<(FiscalStatus, Option<String>)> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _, _)| id == invoice_id)
            .map(|(_, status, fiscal_id)| (*status, fiscal_id.clone()))
    }

    pub fn history_for(&self, invoice_id: &str) -> Vec<FiscalStatus> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _, _)| id == invoice_id)
            .map(|(_, status, _)| *status)
            .collect()
    }
}

#[async_trait]
impl InvoiceStatusSink for RecordingSink {
    async fn update_status(
        &self,
        _tenant_id: &str,
        invoice_id: &str,
        status: FiscalStatus,
        fiscal_id: Option<String>,
    ) {
        self.updates
            .lock()
            .unwrap()
            .push((invoice_id.to_string(), status, fiscal_id));
    }
}

// =============================================================================
// TRANSPORTS
// =============================================================================

/// Panics on any send; proves sandbox isolation.
pub struct RefusingTransport;

#[async_trait]
impl Transport for RefusingTransport {
    async fn send(&self, _request: WireRequest) -> Result<RawResponse, FiscalError> {
        panic!("sandbox flow must not touch the transport");
    }
}

/// Replays a scripted sequence of replies and keeps every request it saw.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<WireRequest>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<WireRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: WireRequest) -> Result<RawResponse, FiscalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(body)) => Ok(RawResponse::new(body)),
            Some(Err(detail)) => Err(FiscalError::Transport(detail)),
            None => Err(FiscalError::Transport("script exhausted".to_string())),
        }
    }
}

// =============================================================================
// DISPATCHER WIRING
// =============================================================================

/// Retry schedule with zero delays so retry flows finish instantly.
pub fn fast_config() -> DispatcherConfig {
    DispatcherConfig {
        backoff: vec![std::time::Duration::ZERO; 5],
        ..DispatcherConfig::default()
    }
}

pub struct Harness {
    pub ledger: Arc<InMemoryLedger>,
    pub sink: Arc<RecordingSink>,
    pub dispatcher: Dispatcher,
}

/// Inline dispatcher over an in-memory ledger; sends complete before the
/// trigger call returns.
pub fn inline_harness(config: TenantConfig, transport: Arc<dyn Transport>) -> Harness {
    init_tracing();
    let ledger = Arc::new(InMemoryLedger::new());
    let sink = RecordingSink::new();
    let dispatcher = Dispatcher::new_inline(
        ledger.clone(),
        StaticConfigStore::single(config),
        sink.clone(),
        transport,
        fixed_clock(),
        fast_config(),
    );
    Harness {
        ledger,
        sink,
        dispatcher,
    }
}
