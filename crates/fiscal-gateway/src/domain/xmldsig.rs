//! # Enveloped XML-DSig
//!
//! Production F1 documents carry an enveloped `<Signature>` referencing the
//! request root by `Id`. The serializer in [`super::retail`] emits stable
//! attribute order and no insignificant whitespace, so the serialized bytes
//! are treated as their own canonical form: the digest covers the document
//! with the declaration stripped and the signature element absent, exactly
//! as a verifier applying enveloped-signature + c14n transforms would see it.
//!
//! Certificate chain validation against the authority trust store is the
//! provider's job; verification here checks the signature against a caller-
//! supplied public key only.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use fiscal_types::FiscalError;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

/// Algorithm and transform URIs advertised inside `SignedInfo`.
pub const C14N_URI: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
pub const SIGNATURE_URI: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
pub const DIGEST_URI: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
pub const ENVELOPED_URI: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
const DSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Private key plus certificate, decoded from tenant PEM material.
pub struct SignatureMaterial {
    key: RsaPrivateKey,
    /// Base64 certificate body with PEM armor and line breaks removed.
    cert_b64: String,
}

impl SignatureMaterial {
    pub fn from_pem(key_pem: &str, cert_pem: &str) -> Result<Self, FiscalError> {
        let key = RsaPrivateKey::from_pkcs8_pem(key_pem)
            .map_err(|e| FiscalError::Signing(format!("private key: {e}")))?;
        let cert_b64 = pem_body(cert_pem)
            .ok_or_else(|| FiscalError::Signing("certificate is not PEM".to_string()))?;
        Ok(Self { key, cert_b64 })
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.key
    }
}

fn pem_body(pem: &str) -> Option<String> {
    let mut body = String::new();
    let mut inside = false;
    for line in pem.lines() {
        if line.starts_with("-----BEGIN") {
            inside = true;
        } else if line.starts_with("-----END") {
            return if body.is_empty() { None } else { Some(body) };
        } else if inside {
            body.push_str(line.trim());
        }
    }
    None
}

fn strip_declaration(document: &str) -> &str {
    match document.find("?>") {
        Some(pos) if document.starts_with("<?xml") => document[pos + 2..].trim_start(),
        _ => document,
    }
}

/// Signs `document` (the serialized request) and returns it with the
/// `<Signature>` element inserted before the closing root tag.
pub fn sign_enveloped(
    document: &str,
    root_id: &str,
    root_qname: &str,
    material: &SignatureMaterial,
) -> Result<String, FiscalError> {
    let digest = Sha256::digest(strip_declaration(document).as_bytes());
    let digest_b64 = BASE64.encode(digest);

    // SignedInfo is built with its namespace declared inline so the bytes
    // signed here are the bytes a verifier canonicalizes.
    let signed_info = format!(
        "<SignedInfo xmlns=\"{DSIG_NS}\">\
         <CanonicalizationMethod Algorithm=\"{C14N_URI}\"></CanonicalizationMethod>\
         <SignatureMethod Algorithm=\"{SIGNATURE_URI}\"></SignatureMethod>\
         <Reference URI=\"#{root_id}\">\
         <Transforms>\
         <Transform Algorithm=\"{ENVELOPED_URI}\"></Transform>\
         <Transform Algorithm=\"{C14N_URI}\"></Transform>\
         </Transforms>\
         <DigestMethod Algorithm=\"{DIGEST_URI}\"></DigestMethod>\
         <DigestValue>{digest_b64}</DigestValue>\
         </Reference>\
         </SignedInfo>"
    );

    let signing_key = SigningKey::<Sha256>::new(material.key.clone());
    let signature = signing_key
        .try_sign(signed_info.as_bytes())
        .map_err(|e| FiscalError::Signing(format!("xmldsig signature: {e}")))?;
    let signature_b64 = BASE64.encode(signature.to_vec());

    let signature_element = format!(
        "<Signature xmlns=\"{DSIG_NS}\">\
         {signed_info}\
         <SignatureValue>{signature_b64}</SignatureValue>\
         <KeyInfo><X509Data><X509Certificate>{}</X509Certificate></X509Data></KeyInfo>\
         </Signature>",
        material.cert_b64
    );

    let closing = format!("</{root_qname}>");
    let insert_at = document
        .rfind(&closing)
        .ok_or_else(|| FiscalError::Signing(format!("document has no {closing}")))?;
    let mut signed = String::with_capacity(document.len() + signature_element.len());
    signed.push_str(&document[..insert_at]);
    signed.push_str(&signature_element);
    signed.push_str(&document[insert_at..]);
    Ok(signed)
}

/// Verifies an enveloped signature produced by [`sign_enveloped`] against a
/// caller-supplied public key.
pub fn verify_enveloped(signed_document: &str, public_key: &RsaPublicKey) -> Result<(), FiscalError> {
    let sig_start = signed_document
        .find("<Signature ")
        .ok_or_else(|| FiscalError::Signing("no Signature element".to_string()))?;
    let sig_close = "</Signature>";
    let sig_end = signed_document[sig_start..]
        .find(sig_close)
        .map(|pos| sig_start + pos + sig_close.len())
        .ok_or_else(|| FiscalError::Signing("unterminated Signature element".to_string()))?;
    let signature_element = &signed_document[sig_start..sig_end];

    // Enveloped-signature transform: document without the Signature element.
    let mut unsigned = String::with_capacity(signed_document.len());
    unsigned.push_str(&signed_document[..sig_start]);
    unsigned.push_str(&signed_document[sig_end..]);

    let signed_info = extract(signature_element, "<SignedInfo", "</SignedInfo>")
        .ok_or_else(|| FiscalError::Signing("no SignedInfo".to_string()))?;
    let digest_b64 = extract_text(signature_element, "<DigestValue>", "</DigestValue>")
        .ok_or_else(|| FiscalError::Signing("no DigestValue".to_string()))?;
    let signature_b64 = extract_text(signature_element, "<SignatureValue>", "</SignatureValue>")
        .ok_or_else(|| FiscalError::Signing("no SignatureValue".to_string()))?;

    let expected_digest = BASE64.encode(Sha256::digest(strip_declaration(&unsigned).as_bytes()));
    if expected_digest != digest_b64 {
        return Err(FiscalError::Signing("digest mismatch".to_string()));
    }

    let signature_bytes = BASE64
        .decode(signature_b64)
        .map_err(|e| FiscalError::Signing(format!("signature not base64: {e}")))?;
    let signature = Signature::try_from(signature_bytes.as_slice())
        .map_err(|e| FiscalError::Signing(format!("signature malformed: {e}")))?;
    let verifying_key = VerifyingKey::<Sha256>::new(public_key.clone());
    verifying_key
        .verify(signed_info.as_bytes(), &signature)
        .map_err(|_| FiscalError::Signing("signature verification failed".to_string()))
}

fn extract<'a>(haystack: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = haystack.find(open)?;
    let end = haystack[start..].find(close)? + start + close.len();
    Some(&haystack[start..end])
}

fn extract_text<'a>(haystack: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = haystack.find(open)? + open.len();
    let end = haystack[start..].find(close)? + start;
    Some(&haystack[start..end])
}
