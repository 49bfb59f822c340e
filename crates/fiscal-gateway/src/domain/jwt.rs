//! HS256 bearer tokens for the F2 channel.

use chrono::{DateTime, Utc};
use fiscal_types::FiscalError;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Claims carried by an F2 token: a fingerprint of the exact body being
/// submitted plus the issuance time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Hex SHA-256 of the serialized JSON body.
    pub payload: String,
    pub iat: i64,
}

/// Issues an HS256 token binding `body` to `issued_at`.
pub fn issue_token(
    body: &serde_json::Value,
    shared_secret: &str,
    issued_at: DateTime<Utc>,
) -> Result<String, FiscalError> {
    let serialized = serde_json::to_vec(body)
        .map_err(|e| FiscalError::Signing(format!("token payload: {e}")))?;
    let claims = TokenClaims {
        payload: hex::encode(Sha256::digest(&serialized)),
        iat: issued_at.timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(shared_secret.as_bytes()),
    )
    .map_err(|e| FiscalError::Signing(format!("token encode: {e}")))
}

/// Decodes and verifies a token issued by [`issue_token`].
pub fn decode_token(token: &str, shared_secret: &str) -> Result<TokenClaims, FiscalError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    jsonwebtoken::decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(shared_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| FiscalError::Signing(format!("token decode: {e}")))
}
