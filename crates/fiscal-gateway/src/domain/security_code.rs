//! # Security Code (ZastKod)
//!
//! Client-side deterministic receipt fingerprint embedded in every F1
//! request. The input is a separator-free concatenation of six fields; in
//! production the concatenation is signed with the tenant private key
//! (RSA-SHA1 per the national specification) and the signature is MD5-hashed.
//! Sandbox mode hashes the plain concatenation instead, which is clearly
//! non-authoritative but reproducible.

use fiscal_types::{format_amount, NumberTriple};
use md5::{Digest, Md5};
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use rust_decimal::Decimal;
use sha1::Sha1;

use fiscal_types::FiscalError;

/// Signing strategy for the code derivation.
pub enum CodeSigner<'a> {
    /// Hex MD5 of the plain concatenation. Sandbox only.
    SandboxPlaceholder,
    /// RSA-SHA1 signature of the concatenation, then hex MD5 of the
    /// signature bytes.
    RsaKey(&'a RsaPrivateKey),
}

/// Builds the concatenated input string:
/// `oib ∥ datetime ∥ ord ∥ location ∥ device ∥ total`.
///
/// `timestamp_text` must already be in the F1 textual form
/// (`DD.MM.YYYYThh:mm:ss`) and `grand_total` is formatted to two decimals
/// here so the code input can never diverge from the payload.
pub fn code_input(
    seller_tax_id: &str,
    timestamp_text: &str,
    triple: &NumberTriple,
    grand_total: Decimal,
) -> String {
    format!(
        "{}{}{}{}{}{}",
        seller_tax_id,
        timestamp_text,
        triple.ord,
        triple.location,
        triple.device,
        format_amount(grand_total)
    )
}

/// Derives the hex security code from the concatenated input.
pub fn derive(input: &str, signer: &CodeSigner<'_>) -> Result<String, FiscalError> {
    let digest_input: Vec<u8> = match signer {
        CodeSigner::SandboxPlaceholder => input.as_bytes().to_vec(),
        CodeSigner::RsaKey(key) => {
            let signing_key = SigningKey::<Sha1>::new((*key).clone());
            signing_key
                .try_sign(input.as_bytes())
                .map_err(|e| FiscalError::Signing(format!("security code signature: {e}")))?
                .to_vec()
        }
    };
    let mut hasher = Md5::new();
    hasher.update(&digest_input);
    Ok(hex::encode(hasher.finalize()))
}
