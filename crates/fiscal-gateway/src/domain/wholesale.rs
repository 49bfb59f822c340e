//! # F2 Payload Builder and Response Parser
//!
//! The wholesale channel takes a JSON document. Monetary values are emitted
//! as plain JSON numbers rounded to two decimals; `Decimal` is used for all
//! arithmetic and only converted at the serialization boundary.

use chrono::{DateTime, Utc};
use fiscal_types::{two_dp, BuiltPayload, BuyerKind, FiscalError, InvoiceView, ParsedResponse, PartyInfo};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Map, Value};

/// Wire protocol version tag.
pub const F2_VERSION: &str = "2.0";

/// Converts a monetary `Decimal` to a two-decimal JSON number.
fn json_amount(value: rust_decimal::Decimal) -> Result<Value, FiscalError> {
    let rounded = two_dp(value);
    rounded
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| FiscalError::Build(format!("amount {rounded} not representable")))
}

fn party_block(party: &PartyInfo) -> Value {
    json!({
        "oib": party.tax_id,
        "name": party.name,
        "address": party.address,
        "city": party.city,
        "postalCode": party.postal_code,
        "vatId": party.vat_id,
    })
}

/// Builds the F2 request body for an invoice.
///
/// `timestamp` is the submission datetime frozen at FiscalRequest creation.
/// Item and `vatSummary` ordering follows line order in the invoice.
pub fn build_request(
    invoice: &InvoiceView,
    operator_tax_id: Option<&str>,
    timestamp: DateTime<Utc>,
) -> Result<BuiltPayload, FiscalError> {
    let mut items = Vec::with_capacity(invoice.lines.len());
    for line in &invoice.lines {
        items.push(json!({
            "name": line.name,
            "quantity": json_amount(line.quantity)?,
            "unitPrice": json_amount(line.unit_price)?,
            "discount": json_amount(line.discount)?,
            "rebate": json_amount(line.rebate)?,
            "vatRate": json_amount(line.vat_rate)?,
            "baseAmount": json_amount(line.base_amount)?,
            "vatAmount": json_amount(line.vat_amount)?,
            "totalAmount": json_amount(line.total_amount)?,
        }));
    }

    let mut vat_summary = Vec::new();
    for (rate, bucket) in invoice.vat_summary_ordered() {
        vat_summary.push(json!({
            "rate": json_amount(rate)?,
            "baseAmount": json_amount(bucket.base_amount)?,
            "vatAmount": json_amount(bucket.vat_amount)?,
        }));
    }

    let totals = invoice.totals();

    let mut body = Map::new();
    body.insert("version".to_string(), Value::String(F2_VERSION.to_string()));
    body.insert("documentType".to_string(), Value::String("invoice".to_string()));
    body.insert(
        "documentId".to_string(),
        Value::String(invoice.invoice_id.clone()),
    );
    body.insert("timestamp".to_string(), Value::String(timestamp.to_rfc3339()));
    body.insert("issuer".to_string(), party_block(&invoice.issuer));
    if invoice.buyer_kind == BuyerKind::LegalEntity {
        if let Some(buyer) = &invoice.buyer {
            let mut block = party_block(buyer);
            if let Some(obj) = block.as_object_mut() {
                obj.insert(
                    "clientType".to_string(),
                    Value::String("legal_entity".to_string()),
                );
            }
            body.insert("buyer".to_string(), block);
        }
    }
    body.insert(
        "invoice".to_string(),
        json!({
            "number": invoice.number,
            "date": invoice.issue_date.to_string(),
            "dueDate": invoice.due_date.map(|d| d.to_string()),
            "salesChannel": invoice.sales_channel.as_str(),
            "paymentMethod": invoice.payment_method.as_str(),
            "operatorOib": operator_tax_id.unwrap_or_else(|| invoice.operator_or_issuer_tax_id()),
            "location": invoice.location_tag,
            "deviceId": invoice.device_tag,
            "notes": invoice.notes,
            "isPaid": invoice.is_paid,
            "paymentDate": invoice.payment_date.map(|d| d.to_string()),
        }),
    );
    body.insert("items".to_string(), Value::Array(items));
    body.insert("vatSummary".to_string(), Value::Array(vat_summary));
    body.insert(
        "totals".to_string(),
        json!({
            "pretax_amount": json_amount(totals.pretax_amount)?,
            "vat_amount": json_amount(totals.vat_amount)?,
            "total_amount": json_amount(totals.total_amount)?,
        }),
    );

    Ok(BuiltPayload::Wholesale {
        body: Value::Object(body),
    })
}

/// Parses a provider JSON reply. Success discriminator is `status == "OK"`,
/// compared case-insensitively.
pub fn parse_response(body: &str) -> ParsedResponse {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => return ParsedResponse::parse_error(format!("malformed json: {e}")),
    };
    let status = value.get("status").and_then(Value::as_str);
    if status.is_some_and(|s| s.eq_ignore_ascii_case("OK")) {
        let fiscal_id = value
            .get("fiscal_id")
            .or_else(|| value.get("jir"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("accepted");
        return ParsedResponse::success(fiscal_id, message);
    }
    let error_code = value
        .get("error_code")
        .or_else(|| value.get("code"))
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN");
    let message = value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("rejected without message");
    ParsedResponse::reject(error_code, message)
}
