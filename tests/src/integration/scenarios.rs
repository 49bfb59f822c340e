//! # End-to-End Scenarios
//!
//! Each test walks one full submission flow: business event in, ledger
//! rows and invoice status write-backs out.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fiscal_gateway::adapters::{SANDBOX_FISCAL_ID, SANDBOX_JIR};
    use fiscal_ledger::Ledger;
    use fiscal_types::{
        idempotency_key, BuiltPayload, DocumentStatus, DocumentType, FiscalStatus, Regime,
        RequestStatus,
    };

    use crate::support::*;

    fn key_for(invoice_id: &str, version: u32) -> String {
        idempotency_key("t-1", DocumentType::Invoice, invoice_id, version)
    }

    // =========================================================================
    // S1: RETAIL HAPPY PATH (SANDBOX)
    // =========================================================================

    #[tokio::test]
    async fn retail_sandbox_happy_path() {
        let h = inline_harness(sandbox_config(), Arc::new(RefusingTransport));
        let invoice = retail_invoice();
        h.dispatcher.on_invoice_created(&invoice).await;

        let request = h
            .ledger
            .find_active_request(&key_for("inv-1", 1))
            .await
            .expect("request created");
        assert_eq!(request.status, RequestStatus::Sent);
        assert_eq!(request.attempt_count, 1);

        let BuiltPayload::Retail { xml, .. } = &request.payload else {
            panic!("retail invoice must build an XML payload");
        };
        assert!(xml.contains("<tns:Oib>12345678901</tns:Oib>"));
        assert!(xml.contains("<tns:BrOznRac>1</tns:BrOznRac>"));
        assert!(xml.contains("<tns:OznPosPr>POS1</tns:OznPosPr>"));
        assert!(xml.contains("<tns:OznNapUr>DEV1</tns:OznNapUr>"));
        assert!(xml.contains("<tns:Stopa>25.00</tns:Stopa>"));
        assert!(xml.contains("<tns:Osnovica>100.00</tns:Osnovica>"));
        assert!(xml.contains("<tns:Iznos>25.00</tns:Iznos>"));
        assert!(xml.contains("<tns:IznosUkupno>125.00</tns:IznosUkupno>"));
        assert!(xml.contains("<tns:NacinPlac>G</tns:NacinPlac>"));

        let responses = h.ledger.responses(request.id).await;
        assert_eq!(responses.len(), 1);
        assert!(responses[0].raw.contains(SANDBOX_JIR));
        assert_eq!(responses[0].parsed.fiscal_id.as_deref(), Some(SANDBOX_JIR));

        let document = h.ledger.document(request.document_id).await.unwrap();
        assert_eq!(document.status, DocumentStatus::Processed);

        assert_eq!(
            h.sink.history_for("inv-1"),
            vec![FiscalStatus::Enqueued, FiscalStatus::Processed]
        );
        let (status, fiscal_id) = h.sink.last_for("inv-1").unwrap();
        assert_eq!(status, FiscalStatus::Processed);
        assert_eq!(fiscal_id.as_deref(), Some(SANDBOX_JIR));
    }

    // =========================================================================
    // S2: WHOLESALE HAPPY PATH (SANDBOX)
    // =========================================================================

    #[tokio::test]
    async fn wholesale_sandbox_happy_path() {
        let h = inline_harness(sandbox_config(), Arc::new(RefusingTransport));
        let invoice = wholesale_invoice();
        h.dispatcher.on_invoice_created(&invoice).await;

        let request = h
            .ledger
            .find_active_request(&key_for("inv-2", 1))
            .await
            .expect("request created");
        assert_eq!(request.status, RequestStatus::Sent);

        let BuiltPayload::Wholesale { body } = &request.payload else {
            panic!("legal-entity invoice must build a JSON payload");
        };
        assert_eq!(body["vatSummary"][0]["rate"], serde_json::json!(13.0));
        assert_eq!(body["vatSummary"][0]["baseAmount"], serde_json::json!(200.0));
        assert_eq!(body["vatSummary"][0]["vatAmount"], serde_json::json!(26.0));
        assert_eq!(body["totals"]["total_amount"], serde_json::json!(226.0));

        let (status, fiscal_id) = h.sink.last_for("inv-2").unwrap();
        assert_eq!(status, FiscalStatus::Processed);
        assert_eq!(fiscal_id.as_deref(), Some(SANDBOX_FISCAL_ID));
    }

    // =========================================================================
    // S3: THRESHOLD UPGRADE
    // =========================================================================

    #[tokio::test]
    async fn natural_person_above_threshold_routes_to_wholesale() {
        let h = inline_harness(sandbox_config(), Arc::new(RefusingTransport));
        let mut invoice = retail_invoice();
        invoice.lines = vec![line("25.00", "4000.00", "1000.00")];
        h.dispatcher.on_invoice_created(&invoice).await;

        let request = h
            .ledger
            .find_active_request(&key_for("inv-1", 1))
            .await
            .expect("request created");
        assert_eq!(request.payload.regime(), Regime::WholesaleF2);
    }

    // =========================================================================
    // S4: IDEMPOTENT RE-TRIGGER
    // =========================================================================

    #[tokio::test]
    async fn repeated_events_produce_one_submission() {
        let h = inline_harness(sandbox_config(), Arc::new(RefusingTransport));
        let invoice = retail_invoice();
        h.dispatcher.on_invoice_created(&invoice).await;
        h.dispatcher.on_invoice_created(&invoice).await;
        let mut paid = invoice.clone();
        paid.is_paid = true;
        h.dispatcher.on_invoice_paid(&paid).await;

        let request = h
            .ledger
            .find_active_request(&key_for("inv-1", 1))
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Sent);
        // One stubbed call: one attempt, one response row.
        assert_eq!(request.attempt_count, 1);
        assert_eq!(h.ledger.responses(request.id).await.len(), 1);
        // Re-triggers were absorbed before the enqueue write-back.
        let enqueues = h
            .sink
            .history_for("inv-1")
            .into_iter()
            .filter(|s| *s == FiscalStatus::Enqueued)
            .count();
        assert_eq!(enqueues, 1);
    }

    // =========================================================================
    // S5: VALIDATION FAILURE, THEN AMENDED RESUBMISSION
    // =========================================================================

    #[tokio::test]
    async fn empty_invoice_fails_preconditions_until_amended() {
        let h = inline_harness(sandbox_config(), Arc::new(RefusingTransport));
        let mut invoice = retail_invoice();
        invoice.lines.clear();
        h.dispatcher.on_invoice_created(&invoice).await;

        let (status, fiscal_id) = h.sink.last_for("inv-1").unwrap();
        assert_eq!(status, FiscalStatus::Failed);
        assert!(fiscal_id.is_none());
        assert!(h
            .ledger
            .find_active_request(&key_for("inv-1", 1))
            .await
            .is_none());

        // Amended and version-bumped: a fresh key, a fresh submission.
        let mut amended = retail_invoice();
        amended.version = 2;
        h.dispatcher.on_invoice_created(&amended).await;
        let request = h
            .ledger
            .find_active_request(&key_for("inv-1", 2))
            .await
            .expect("amended invoice resubmits under a new key");
        assert_eq!(request.status, RequestStatus::Sent);
        assert_eq!(h.sink.last_for("inv-1").unwrap().0, FiscalStatus::Processed);
    }

    // =========================================================================
    // S6: TRANSPORT RETRY (WHOLESALE, PRODUCTION)
    // =========================================================================

    #[tokio::test]
    async fn transport_error_retries_then_succeeds() {
        let transport = ScriptedTransport::new(vec![
            Err("connection timed out".to_string()),
            Ok(r#"{"status":"OK","fiscal_id":"V2-77","message":"accepted"}"#.to_string()),
        ]);
        let h = inline_harness(production_f2_config(), transport.clone());
        h.dispatcher.on_invoice_created(&wholesale_invoice()).await;

        assert_eq!(transport.calls(), 2);
        let request = h
            .ledger
            .find_active_request(&key_for("inv-2", 1))
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Sent);
        assert_eq!(request.attempt_count, 2);

        // Attempt history: one synthetic transport-error row, one reply.
        let responses = h.ledger.responses(request.id).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(
            responses[0].parsed.error_code.as_deref(),
            Some("transport-error")
        );
        assert!(responses[1].parsed.ok);

        let (status, fiscal_id) = h.sink.last_for("inv-2").unwrap();
        assert_eq!(status, FiscalStatus::Processed);
        assert_eq!(fiscal_id.as_deref(), Some("V2-77"));
    }

    #[tokio::test]
    async fn retry_budget_exhaustion_fails_the_request() {
        let transport = ScriptedTransport::new(vec![
            Err("timeout".to_string()),
            Err("timeout".to_string()),
            Err("timeout".to_string()),
            Err("timeout".to_string()),
            Err("timeout".to_string()),
        ]);
        let h = inline_harness(production_f2_config(), transport.clone());
        h.dispatcher.on_invoice_created(&wholesale_invoice()).await;

        assert_eq!(transport.calls(), 5);
        // A failed request releases the key, so look it up via the document.
        assert!(h
            .ledger
            .find_active_request(&key_for("inv-2", 1))
            .await
            .is_none());
        let document = h
            .ledger
            .open_document("t-1", DocumentType::Invoice, "inv-2", frozen_instant())
            .await;
        let requests = h.ledger.requests_for_document(document.id).await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].status, RequestStatus::Failed);
        assert_eq!(requests[0].attempt_count, 5);
        assert_eq!(h.ledger.responses(requests[0].id).await.len(), 5);
        assert_eq!(h.sink.last_for("inv-2").unwrap().0, FiscalStatus::Failed);
    }

    // =========================================================================
    // S7: REMOTE REJECT (RETAIL, PRODUCTION)
    // =========================================================================

    #[tokio::test]
    async fn remote_reject_is_terminal() {
        let reject_body = r#"<tns:RacunOdgovor xmlns:tns="http://www.apis-it.hr/fin/2012/types/f73">
              <tns:Greske><tns:Greska>
                <tns:SifraGreske>s002</tns:SifraGreske>
                <tns:PorukaGreske>bad OIB</tns:PorukaGreske>
              </tns:Greska></tns:Greske>
            </tns:RacunOdgovor>"#;
        let transport = ScriptedTransport::new(vec![Ok(reject_body.to_string())]);
        let h = inline_harness(production_f1_config(), transport.clone());
        h.dispatcher.on_invoice_created(&retail_invoice()).await;

        // No retries for permanent rejections.
        assert_eq!(transport.calls(), 1);

        let document_status = h.sink.last_for("inv-1").unwrap().0;
        assert_eq!(document_status, FiscalStatus::Failed);

        // The envelope that went out was signed.
        let sent = transport.requests();
        let body = String::from_utf8(sent[0].body.clone()).unwrap();
        assert!(body.contains("<soapenv:Envelope"));
        assert!(body.contains("<Signature "));

        // Ledger: request failed with the parsed rejection attached.
        assert!(
            h.ledger
                .find_active_request(&key_for("inv-1", 1))
                .await
                .is_none(),
            "failed request releases the key"
        );
        let document = h
            .ledger
            .open_document("t-1", DocumentType::Invoice, "inv-1", frozen_instant())
            .await;
        assert_eq!(document.status, DocumentStatus::Failed);
        let requests = h.ledger.requests_for_document(document.id).await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].status, RequestStatus::Failed);
        let responses = h.ledger.responses(requests[0].id).await;
        assert_eq!(responses.len(), 1);
        assert!(!responses[0].parsed.ok);
        assert_eq!(responses[0].parsed.error_code.as_deref(), Some("s002"));
        assert_eq!(responses[0].parsed.message.as_deref(), Some("bad OIB"));
    }
}
