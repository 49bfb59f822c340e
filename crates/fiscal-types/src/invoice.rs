//! # Invoice Snapshot
//!
//! The frozen, read-only view of a business invoice at submission time.
//!
//! The surrounding application owns the invoice record; the gateway only ever
//! sees this snapshot and guarantees it stays stable for the lifetime of one
//! submission. Derived views (VAT summary, totals, number triple) are computed
//! here so every payload builder works from the same arithmetic.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amounts::two_dp;

/// Buyer classification driving the routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuyerKind {
    /// Consumer sale, routed to the retail (F1) regime.
    NaturalPerson,
    /// Business-to-business sale, routed to the wholesale (F2) regime.
    LegalEntity,
}

/// Payment method tag carried on the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Other,
}

impl PaymentMethod {
    /// One-letter tag used in the F1 `NacinPlac` element.
    pub fn retail_tag(self) -> &'static str {
        match self {
            Self::Cash => "G",
            Self::Card => "K",
            Self::BankTransfer | Self::Other => "C",
        }
    }

    /// Snake-case name used in the F2 JSON payload.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::Other => "other",
        }
    }
}

/// Sales channel of the invoice.
///
/// Only retail and wholesale invoices are fiscally relevant; anything else
/// never reaches the dispatcher's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesChannel {
    Retail,
    Wholesale,
    Internal,
}

impl SalesChannel {
    /// Whether invoices on this channel must be fiscalized.
    pub fn is_fiscally_relevant(self) -> bool {
        matches!(self, Self::Retail | Self::Wholesale)
    }

    /// Snake-case name used in the F2 JSON payload.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Retail => "retail",
            Self::Wholesale => "wholesale",
            Self::Internal => "internal",
        }
    }
}

/// Identification block for the issuer or a legal-entity buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyInfo {
    /// National tax identifier (OIB).
    pub tax_id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    /// VAT identifier, when the party is VAT-registered.
    pub vat_id: Option<String>,
}

/// A single invoice line.
///
/// Base, VAT, and total amounts are carried on the line (pre-computed by the
/// owning application); the summary views below only aggregate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Discount percentage applied to the line.
    pub discount: Decimal,
    /// Rebate percentage applied after the discount.
    pub rebate: Decimal,
    /// VAT rate percentage (e.g. `25.00`).
    pub vat_rate: Decimal,
    pub base_amount: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
}

/// Per-rate VAT aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VatBucket {
    pub base_amount: Decimal,
    pub vat_amount: Decimal,
}

/// Monetary totals across all lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub pretax_amount: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
}

/// The invoice-number triple used by the F1 `BrRac` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberTriple {
    /// Sequential ordinal (`BrOznRac`).
    pub ord: String,
    /// Business location tag (`OznPosPr`).
    pub location: String,
    /// Payment device tag (`OznNapUr`).
    pub device: String,
}

/// Immutable invoice snapshot consumed by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceView {
    /// Issuing tenant (business subject).
    pub tenant_id: String,
    /// Business identifier of the invoice record.
    pub invoice_id: String,
    /// Human-readable invoice number, typically `ord/location/device`.
    pub number: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub buyer_kind: BuyerKind,
    pub payment_method: PaymentMethod,
    pub sales_channel: SalesChannel,
    pub issuer: PartyInfo,
    /// Present for legal-entity buyers; consumers stay anonymous.
    pub buyer: Option<PartyInfo>,
    /// Operator tax id; falls back to the issuer tax id when absent.
    pub operator_tax_id: Option<String>,
    /// Business location tag, used when the number does not carry one.
    pub location_tag: String,
    /// Payment device tag, used when the number does not carry one.
    pub device_tag: String,
    pub notes: Option<String>,
    pub is_paid: bool,
    pub payment_date: Option<NaiveDate>,
    /// Submission version; operators bump it to force a logically distinct
    /// re-submission under a fresh idempotency key.
    pub version: u32,
    /// Ordered line items; order is preserved in every payload.
    pub lines: Vec<InvoiceLine>,
}

impl InvoiceView {
    /// Per-rate VAT summary, keyed ascending by rate.
    pub fn vat_summary(&self) -> BTreeMap<Decimal, VatBucket> {
        let mut summary: BTreeMap<Decimal, VatBucket> = BTreeMap::new();
        for line in &self.lines {
            let bucket = summary.entry(two_dp(line.vat_rate)).or_default();
            bucket.base_amount += line.base_amount;
            bucket.vat_amount += line.vat_amount;
        }
        summary
    }

    /// Per-rate VAT summary in the order rates first appear in the lines.
    ///
    /// The F2 payload requires `vatSummary` to follow line order rather than
    /// numeric rate order.
    pub fn vat_summary_ordered(&self) -> Vec<(Decimal, VatBucket)> {
        let mut summary: Vec<(Decimal, VatBucket)> = Vec::new();
        for line in &self.lines {
            let rate = two_dp(line.vat_rate);
            match summary.iter_mut().find(|(r, _)| *r == rate) {
                Some((_, bucket)) => {
                    bucket.base_amount += line.base_amount;
                    bucket.vat_amount += line.vat_amount;
                }
                None => summary.push((
                    rate,
                    VatBucket {
                        base_amount: line.base_amount,
                        vat_amount: line.vat_amount,
                    },
                )),
            }
        }
        summary
    }

    /// Monetary totals aggregated over all lines.
    pub fn totals(&self) -> Totals {
        let mut pretax = Decimal::ZERO;
        let mut vat = Decimal::ZERO;
        for line in &self.lines {
            pretax += line.base_amount;
            vat += line.vat_amount;
        }
        Totals {
            pretax_amount: pretax,
            vat_amount: vat,
            total_amount: pretax + vat,
        }
    }

    /// Grand total (pre-tax plus VAT), two decimal places.
    pub fn grand_total(&self) -> Decimal {
        two_dp(self.totals().total_amount)
    }

    /// Splits the invoice number into the F1 `BrRac` triple.
    ///
    /// Numbers with at least three `/`-separated parts supply the triple
    /// directly; anything else uses the whole number as the ordinal and the
    /// tenant-provided location/device tags as fallback.
    pub fn number_triple(&self) -> NumberTriple {
        let parts: Vec<&str> = self.number.split('/').collect();
        if parts.len() >= 3 {
            NumberTriple {
                ord: parts[0].to_string(),
                location: parts[1].to_string(),
                device: parts[2].to_string(),
            }
        } else {
            NumberTriple {
                ord: self.number.clone(),
                location: self.location_tag.clone(),
                device: self.device_tag.clone(),
            }
        }
    }

    /// Operator tax id, defaulting to the issuer tax id.
    pub fn operator_or_issuer_tax_id(&self) -> &str {
        self.operator_tax_id.as_deref().unwrap_or(&self.issuer.tax_id)
    }
}
