use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("signature does not match")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token rejected: {0}")]
    Rejected(String),
}

/// Whether the credential's signature is checked before its claims are trusted.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum TokenVerification {
    /// Decode the payload segment only. Role claims come straight from the client.
    #[default]
    Unverified,
    /// HS256 signature and `exp` are validated against `secret`.
    Verified { secret: String },
}

impl TokenVerification {
    pub fn is_verified(&self) -> bool {
        matches!(self, TokenVerification::Verified { .. })
    }
}

impl fmt::Debug for TokenVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenVerification::Unverified => write!(f, "Unverified"),
            TokenVerification::Verified { .. } => write!(f, "Verified {{ secret: <redacted> }}"),
        }
    }
}

/// A decoded session credential.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    claims: Map<String, Value>,
}

impl Credential {
    pub fn from_claims(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    /// The `role` claim, when present and a string.
    pub fn role(&self) -> Option<&str> {
        self.claims.get("role").and_then(Value::as_str)
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }
}

pub fn decode_credential(
    token: &str,
    verification: &TokenVerification,
) -> Result<Credential, CredentialError> {
    let claims = match verification {
        TokenVerification::Unverified => decode_payload(token)?,
        TokenVerification::Verified { secret } => verify_hs256(token, secret)?,
    };
    Ok(Credential::from_claims(claims))
}

/// Base64/JSON-decode the middle segment without looking at the signature.
/// Unlike a browser's `atob`, the URL-safe alphabet (`-`, `_`) is accepted too.
pub fn decode_payload(token: &str) -> Result<Map<String, Value>, CredentialError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(CredentialError::SegmentCount(segments.len()));
    };

    let payload = payload.trim();
    let bytes = STANDARD_LENIENT
        .decode(payload)
        .or_else(|_| URL_SAFE_LENIENT.decode(payload))?;

    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(map) => Ok(map),
        _ => Err(CredentialError::NotAnObject),
    }
}

/// Verify an HS256 token. `exp` is checked when present but not required.
pub fn verify_hs256(token: &str, secret: &str) -> Result<Map<String, Value>, CredentialError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = true;

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Map<String, Value>>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => CredentialError::InvalidSignature,
            ErrorKind::ExpiredSignature => CredentialError::Expired,
            _ => CredentialError::Rejected(e.to_string()),
        })
}
