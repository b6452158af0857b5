pub mod credential;

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use credential::{decode_credential, Credential, CredentialError, TokenVerification};

/// Claims carried by a session token. Only `role` matters to the gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    pub iat: i64,
}

impl Claims {
    /// Claims for `role` expiring `expiry_hours` from now.
    pub fn new(role: impl Into<String>, expiry_hours: u64) -> Result<Self, TokenError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .and_then(|validity| now.checked_add_signed(validity))
            .ok_or(TokenError::InvalidExpiry(expiry_hours))?;

        Ok(Self {
            role: role.into(),
            sub: None,
            exp: Some(exp.timestamp()),
            iat: now.timestamp(),
        })
    }

    pub fn with_subject(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    Generation(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid JWT secret")]
    InvalidSecret,
    #[error("token validity of {0} hours is out of range")]
    InvalidExpiry(u64),
}

/// Sign `claims` with HS256. Used by tooling and tests; the gate itself never issues tokens.
pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::default(), claims, &encoding_key)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            issue_token(&Claims::new("agent", 1).unwrap(), ""),
            Err(TokenError::InvalidSecret)
        ));
    }

    #[test]
    fn expiry_is_in_the_future() {
        let claims = Claims::new("agent", 2).unwrap();
        assert_eq!(claims.exp, Some(claims.iat + 2 * 3600));
    }

    #[test]
    fn out_of_range_expiry_is_rejected() {
        for hours in [u64::MAX, i64::MAX as u64, 3_000_000_000_000_000] {
            assert!(matches!(
                Claims::new("agent", hours),
                Err(TokenError::InvalidExpiry(h)) if h == hours
            ));
        }
    }

    #[test]
    fn issued_token_has_three_segments() {
        let token = issue_token(&Claims::new("agent", 1).unwrap().with_subject("7"), "key").unwrap();
        assert_eq!(token.split('.').count(), 3);
        let payload = credential::decode_payload(&token).unwrap();
        assert_eq!(payload["role"], "agent");
        assert_eq!(payload["sub"], "7");
    }
}
