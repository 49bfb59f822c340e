//! # System Invariants
//!
//! Properties that must hold for every invoice and tenant: idempotency,
//! routing stability, numeric fidelity, state-machine discipline, security
//! code reproducibility, signature well-formedness, sandbox isolation.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use fiscal_dispatcher::{decide_regime, Dispatcher};
    use fiscal_gateway::domain::{wholesale, xmldsig};
    use fiscal_gateway::RetailAdapter;
    use fiscal_ledger::{InMemoryLedger, Ledger};
    use fiscal_types::{
        idempotency_key, BuiltPayload, BuyerKind, DocumentType, Regime, RegimeSelector,
        RequestStatus,
    };
    use rsa::pkcs8::DecodePrivateKey;
    use rsa::RsaPrivateKey;
    use rust_decimal::Decimal;

    use crate::support::*;

    // =========================================================================
    // INVARIANT 1: IDEMPOTENCY
    // =========================================================================

    /// Any number of event callbacks for the same (tenant, invoice, version)
    /// yield one document and one in-flight request, which the worker then
    /// drains exactly once.
    #[tokio::test]
    async fn repeated_triggers_keep_one_inflight_request() {
        let ledger = Arc::new(InMemoryLedger::new());
        let sink = RecordingSink::new();
        let (dispatcher, worker) = Dispatcher::with_worker(
            ledger.clone(),
            StaticConfigStore::single(sandbox_config()),
            sink.clone(),
            Arc::new(RefusingTransport),
            fixed_clock(),
            fast_config(),
            8,
        );

        let invoice = retail_invoice();
        dispatcher.on_invoice_created(&invoice).await;
        dispatcher.on_invoice_created(&invoice).await;
        dispatcher.on_invoice_created(&invoice).await;

        let key = idempotency_key("t-1", DocumentType::Invoice, "inv-1", 1);
        let queued = ledger.find_active_request(&key).await.unwrap();
        assert_eq!(queued.status, RequestStatus::Queued);

        let document = ledger
            .open_document("t-1", DocumentType::Invoice, "inv-1", frozen_instant())
            .await;
        assert_eq!(ledger.requests_for_document(document.id).await.len(), 1);

        // Drain the single job.
        tokio::spawn(worker.run());
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let request = ledger.find_active_request(&key).await.unwrap();
            if request.status == RequestStatus::Sent {
                assert_eq!(request.attempt_count, 1);
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "worker never drained");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    // =========================================================================
    // INVARIANT 2: ROUTING STABILITY
    // =========================================================================

    #[test]
    fn regime_is_a_pure_function_of_its_inputs() {
        let threshold = Decimal::from(3000);
        for _ in 0..10 {
            let retail = retail_invoice();
            assert_eq!(
                decide_regime(&retail, RegimeSelector::Auto, threshold),
                Regime::RetailF1
            );
            let wholesale = wholesale_invoice();
            assert_eq!(
                decide_regime(&wholesale, RegimeSelector::Auto, threshold),
                Regime::WholesaleF2
            );
        }

        // The decision flips only when classification inputs change.
        let mut flipped = retail_invoice();
        flipped.buyer_kind = BuyerKind::LegalEntity;
        assert_eq!(
            decide_regime(&flipped, RegimeSelector::Auto, threshold),
            Regime::WholesaleF2
        );
    }

    // =========================================================================
    // INVARIANT 3: NUMERIC FIDELITY
    // =========================================================================

    /// Per-rate sums of item base amounts equal the vatSummary entries, and
    /// the rate sums of (base + vat) equal the grand total, to the cent.
    #[test]
    fn payload_arithmetic_is_internally_consistent() {
        let mut invoice = wholesale_invoice();
        invoice.lines = vec![
            line("25.00", "100.00", "25.00"),
            line("13.00", "200.00", "26.00"),
            line("25.00", "0.33", "0.08"),
        ];
        let BuiltPayload::Wholesale { body } =
            wholesale::build_request(&invoice, None, frozen_instant()).unwrap()
        else {
            panic!("expected wholesale payload");
        };

        let items = body["items"].as_array().unwrap();
        let summary = body["vatSummary"].as_array().unwrap();
        for entry in summary {
            let rate = entry["rate"].as_f64().unwrap();
            let item_base: f64 = items
                .iter()
                .filter(|item| item["vatRate"].as_f64().unwrap() == rate)
                .map(|item| item["baseAmount"].as_f64().unwrap())
                .sum();
            assert!((item_base - entry["baseAmount"].as_f64().unwrap()).abs() < 0.005);
        }

        let summed: f64 = summary
            .iter()
            .map(|entry| {
                entry["baseAmount"].as_f64().unwrap() + entry["vatAmount"].as_f64().unwrap()
            })
            .sum();
        let total = body["totals"]["total_amount"].as_f64().unwrap();
        assert!((summed - total).abs() < 0.005);
    }

    // =========================================================================
    // INVARIANT 4: MONOTONIC STATE
    // =========================================================================

    #[tokio::test]
    async fn terminal_request_states_accept_no_transitions() {
        let ledger = InMemoryLedger::new();
        let document = ledger
            .open_document("t-1", DocumentType::Invoice, "inv-1", frozen_instant())
            .await;
        let request = ledger
            .new_request(
                document.id,
                BuiltPayload::Wholesale {
                    body: serde_json::json!({}),
                },
                "key",
                frozen_instant(),
            )
            .await
            .unwrap();
        ledger
            .transition(request.id, RequestStatus::Sent)
            .await
            .unwrap();
        for target in [
            RequestStatus::Queued,
            RequestStatus::Error,
            RequestStatus::Failed,
            RequestStatus::Sent,
        ] {
            assert!(ledger.transition(request.id, target).await.is_err());
        }
    }

    // =========================================================================
    // INVARIANT 5: SECURITY CODE REPRODUCIBILITY
    // =========================================================================

    #[test]
    fn security_code_is_stable_for_a_frozen_timestamp() {
        let adapter = RetailAdapter::new(
            production_f1_config(),
            Arc::new(RefusingTransport),
            fixed_clock(),
        )
        .unwrap();
        let invoice = retail_invoice();
        let first = adapter.prepare_payload(&invoice, frozen_instant()).unwrap();
        let second = adapter.prepare_payload(&invoice, frozen_instant()).unwrap();
        let (
            BuiltPayload::Retail {
                security_code: a, ..
            },
            BuiltPayload::Retail {
                security_code: b, ..
            },
        ) = (first, second)
        else {
            panic!("expected retail payloads");
        };
        assert_eq!(a, b);
    }

    // =========================================================================
    // INVARIANT 6: SIGNATURE WELL-FORMEDNESS
    // =========================================================================

    /// Every production envelope carries an enveloped signature that
    /// verifies against the tenant key.
    #[test]
    fn signed_envelope_verifies_against_tenant_key() {
        let adapter = RetailAdapter::new(
            production_f1_config(),
            Arc::new(RefusingTransport),
            fixed_clock(),
        )
        .unwrap();
        let payload = adapter
            .prepare_payload(&retail_invoice(), frozen_instant())
            .unwrap();
        let signed = adapter.sign_payload(&payload).unwrap();
        let fiscal_gateway::SignedPayload::SoapEnvelope { bytes } = signed else {
            panic!("expected soap envelope");
        };
        let envelope = String::from_utf8(bytes).unwrap();

        let start = envelope.find("<soapenv:Body>").unwrap() + "<soapenv:Body>".len();
        let end = envelope.find("</soapenv:Body>").unwrap();
        let document = &envelope[start..end];

        let public_key = RsaPrivateKey::from_pkcs8_pem(TEST_KEY_PEM)
            .unwrap()
            .to_public_key();
        xmldsig::verify_enveloped(document, &public_key).unwrap();

        // Tampering breaks verification.
        let tampered = document.replace("125.00", "225.00");
        assert!(xmldsig::verify_enveloped(&tampered, &public_key).is_err());
    }

    // =========================================================================
    // INVARIANT 7: SANDBOX ISOLATION
    // =========================================================================

    /// Sandbox submissions never touch the transport and yield the same
    /// outcome on every run.
    #[tokio::test]
    async fn sandbox_outcomes_are_deterministic_and_offline() {
        let mut outcomes = Vec::new();
        for _ in 0..2 {
            let h = inline_harness(sandbox_config(), Arc::new(RefusingTransport));
            h.dispatcher.on_invoice_created(&retail_invoice()).await;
            outcomes.push(h.sink.last_for("inv-1").unwrap());
        }
        assert_eq!(outcomes[0], outcomes[1]);
        assert!(outcomes[0].1.is_some());
    }
}
