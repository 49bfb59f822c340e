//! SOAP envelope wrapping and `RacunOdgovor` response parsing for F1.

use fiscal_types::ParsedResponse;
use quick_xml::events::Event;
use quick_xml::Reader;

/// SOAP 1.1 envelope namespace.
pub const SOAP_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Wraps a serialized request document in a SOAP envelope.
///
/// The inner document's XML declaration is stripped; the envelope carries
/// its own.
pub fn wrap_envelope(document: &str) -> String {
    let inner = match document.find("?>") {
        Some(pos) if document.starts_with("<?xml") => document[pos + 2..].trim_start(),
        _ => document,
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <soapenv:Envelope xmlns:soapenv=\"{SOAP_NS}\">\
         <soapenv:Body>{inner}</soapenv:Body>\
         </soapenv:Envelope>"
    )
}

/// Parses a provider reply containing a `RacunOdgovor` element.
///
/// Outcomes:
/// - `Jir` present: success carrying the fiscal identifier.
/// - `SifraGreske`/`PorukaGreske` present: remote rejection.
/// - `RacunOdgovor` present but empty: rejection with code `UNKNOWN`.
/// - no `RacunOdgovor` or malformed XML: parse error (retriable).
pub fn parse_racun_odgovor(body: &str) -> ParsedResponse {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut saw_response = false;
    let mut jir: Option<String> = None;
    let mut error_code: Option<String> = None;
    let mut error_message: Option<String> = None;
    let mut current: Option<&'static str> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current = match e.local_name().as_ref() {
                    b"RacunOdgovor" => {
                        saw_response = true;
                        None
                    }
                    b"Jir" => Some("jir"),
                    b"SifraGreske" => Some("code"),
                    b"PorukaGreske" => Some("message"),
                    _ => None,
                };
            }
            Ok(Event::Text(t)) => {
                let text = match t.unescape() {
                    Ok(text) => text.into_owned(),
                    Err(e) => return ParsedResponse::parse_error(format!("bad text node: {e}")),
                };
                match current {
                    Some("jir") => jir = Some(text),
                    Some("code") => error_code = Some(text),
                    Some("message") => error_message = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return ParsedResponse::parse_error(format!("malformed xml: {e}")),
        }
    }

    if let Some(jir) = jir {
        return ParsedResponse::success(jir, "fiscalized");
    }
    if error_code.is_some() || error_message.is_some() {
        return ParsedResponse::reject(
            error_code.unwrap_or_else(|| "UNKNOWN".to_string()),
            error_message.unwrap_or_else(|| "rejected without message".to_string()),
        );
    }
    if saw_response {
        return ParsedResponse::reject("UNKNOWN", "response carried neither Jir nor error");
    }
    ParsedResponse::parse_error("no RacunOdgovor element in reply")
}
