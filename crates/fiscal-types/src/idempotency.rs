//! # Idempotency Keys
//!
//! Stable fingerprint of `(tenant, document-type, document-id, version)`.
//! Two submissions with equal keys must never result in two remote
//! deliveries; the ledger enforces this by refusing a second request for a
//! key whose predecessor is not in a terminal failure state.

use sha2::{Digest, Sha256};

use crate::status::DocumentType;

/// Derives the idempotency key: `SHA-256(tenant ":" type ":" id ":" version)`
/// hex-encoded.
///
/// `version` defaults to 1 at call sites; operators bump it when a
/// re-submission must be treated as logically distinct.
pub fn idempotency_key(
    tenant_id: &str,
    document_type: DocumentType,
    document_id: &str,
    version: u32,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tenant_id.as_bytes());
    hasher.update(b":");
    hasher.update(document_type.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(document_id.as_bytes());
    hasher.update(b":");
    hasher.update(version.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
