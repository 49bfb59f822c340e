//! # F1 Payload Builder
//!
//! Writes the canonical `RacunZahtjev` XML. Element order and numeric
//! formatting are fixed by the national specification; the serialized bytes
//! double as the canonicalization input for the XML-DSig stage, so nothing
//! here may be pretty-printed or reordered.

use chrono::{DateTime, Utc};
use fiscal_types::{BuiltPayload, FiscalError, InvoiceView};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use uuid::Uuid;

use super::security_code::{self, CodeSigner};

/// Fixed namespace of the F1 message schema.
pub const F1_NS: &str = "http://www.apis-it.hr/fin/2012/types/f73";

/// Qualified name of the request root element.
pub const ROOT_QNAME: &str = "tns:RacunZahtjev";

/// F1 textual datetime form, precise to the second.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%d.%m.%YT%H:%M:%S").to_string()
}

fn text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), FiscalError> {
    let build = |e: quick_xml::Error| FiscalError::Build(format!("xml write: {e}"));
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(build)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(build)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(build)?;
    Ok(())
}

/// Builds the F1 request payload for an invoice.
///
/// `timestamp` is the invoice datetime frozen at FiscalRequest creation;
/// passing the same value reproduces byte-identical XML and `ZastKod`.
/// `operator_tax_id` overrides the invoice operator when the tenant
/// configuration carries one.
pub fn build_request(
    invoice: &InvoiceView,
    operator_tax_id: Option<&str>,
    timestamp: DateTime<Utc>,
    code_signer: &CodeSigner<'_>,
) -> Result<BuiltPayload, FiscalError> {
    let build = |e: quick_xml::Error| FiscalError::Build(format!("xml write: {e}"));

    let root_id = Uuid::new_v4().to_string();
    let message_id = Uuid::new_v4().to_string();
    let timestamp_text = format_timestamp(timestamp);
    let triple = invoice.number_triple();

    let code_input = security_code::code_input(
        &invoice.issuer.tax_id,
        &timestamp_text,
        &triple,
        invoice.grand_total(),
    );
    let security_code = security_code::derive(&code_input, code_signer)?;

    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(build)?;

    let mut root = BytesStart::new(ROOT_QNAME);
    root.push_attribute(("xmlns:tns", F1_NS));
    root.push_attribute(("Id", root_id.as_str()));
    writer.write_event(Event::Start(root)).map_err(build)?;

    // Zaglavlje: message id + generation time.
    writer
        .write_event(Event::Start(BytesStart::new("tns:Zaglavlje")))
        .map_err(build)?;
    text_element(&mut writer, "tns:IdPoruke", &message_id)?;
    text_element(&mut writer, "tns:DatumVrijeme", &timestamp_text)?;
    writer
        .write_event(Event::End(BytesEnd::new("tns:Zaglavlje")))
        .map_err(build)?;

    // Racun: fixed element order per the schema.
    writer
        .write_event(Event::Start(BytesStart::new("tns:Racun")))
        .map_err(build)?;
    text_element(&mut writer, "tns:Oib", &invoice.issuer.tax_id)?;
    text_element(&mut writer, "tns:USustPdv", "1")?;
    text_element(&mut writer, "tns:DatVrijeme", &timestamp_text)?;
    text_element(&mut writer, "tns:OznSlijed", "P")?;

    writer
        .write_event(Event::Start(BytesStart::new("tns:BrRac")))
        .map_err(build)?;
    text_element(&mut writer, "tns:BrOznRac", &triple.ord)?;
    text_element(&mut writer, "tns:OznPosPr", &triple.location)?;
    text_element(&mut writer, "tns:OznNapUr", &triple.device)?;
    writer
        .write_event(Event::End(BytesEnd::new("tns:BrRac")))
        .map_err(build)?;

    // VAT block: one Porez entry per distinct rate, ascending.
    writer
        .write_event(Event::Start(BytesStart::new("tns:Pdv")))
        .map_err(build)?;
    for (rate, bucket) in invoice.vat_summary() {
        writer
            .write_event(Event::Start(BytesStart::new("tns:Porez")))
            .map_err(build)?;
        text_element(&mut writer, "tns:Stopa", &fiscal_types::format_amount(rate))?;
        text_element(
            &mut writer,
            "tns:Osnovica",
            &fiscal_types::format_amount(bucket.base_amount),
        )?;
        text_element(
            &mut writer,
            "tns:Iznos",
            &fiscal_types::format_amount(bucket.vat_amount),
        )?;
        writer
            .write_event(Event::End(BytesEnd::new("tns:Porez")))
            .map_err(build)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("tns:Pdv")))
        .map_err(build)?;

    text_element(
        &mut writer,
        "tns:IznosUkupno",
        &fiscal_types::format_amount(invoice.grand_total()),
    )?;
    text_element(
        &mut writer,
        "tns:NacinPlac",
        invoice.payment_method.retail_tag(),
    )?;
    text_element(
        &mut writer,
        "tns:OibOper",
        operator_tax_id.unwrap_or_else(|| invoice.operator_or_issuer_tax_id()),
    )?;
    text_element(&mut writer, "tns:ZastKod", &security_code)?;
    text_element(&mut writer, "tns:NakDost", "0")?;

    writer
        .write_event(Event::End(BytesEnd::new("tns:Racun")))
        .map_err(build)?;
    writer
        .write_event(Event::End(BytesEnd::new(ROOT_QNAME)))
        .map_err(build)?;

    let xml = String::from_utf8(writer.into_inner())
        .map_err(|e| FiscalError::Build(format!("payload not utf-8: {e}")))?;

    Ok(BuiltPayload::Retail {
        xml,
        root_id,
        security_code,
        timestamp,
    })
}
