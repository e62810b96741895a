use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::config::{SecurityConfig, MAX_TOKEN_LIFETIME_SECS};
use crate::types::UserRole;

/// Identity carried by both access and refresh claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPayload {
    pub user_id: i64,
    pub school_id: String,
    pub role: UserRole,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(flatten)]
    pub payload: ClaimPayload,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Signs and verifies both claim kinds, each with its own secret and lifetime.
#[derive(Clone)]
pub struct TokenSigner {
    access_secret: String,
    access_ttl: Duration,
    refresh_secret: String,
    refresh_ttl: Duration,
}

// Clamped so an unvalidated config cannot overflow chrono.
fn lifetime(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_TOKEN_LIFETIME_SECS) as i64)
}

impl TokenSigner {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            access_secret: config.jwt_secret.clone(),
            access_ttl: lifetime(config.jwt_expiry_secs),
            refresh_secret: config.jwt_refresh_secret.clone(),
            refresh_ttl: lifetime(config.jwt_refresh_expiry_secs),
        }
    }

    fn secret(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    pub fn issue(&self, payload: &ClaimPayload, kind: TokenKind) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = SessionClaims {
            payload: payload.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl(kind)).timestamp(),
        };
        self.sign(&claims, kind)
    }

    fn sign(&self, claims: &SessionClaims, kind: TokenKind) -> Result<String, AuthError> {
        let secret = self.secret(kind);
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn issue_pair(&self, payload: &ClaimPayload) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            token: self.issue(payload, TokenKind::Access)?,
            refresh_token: self.issue(payload, TokenKind::Refresh)?,
        })
    }

    /// Verify signature and expiry.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<SessionClaims, AuthError> {
        let secret = self.secret(kind);
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<SessionClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })
    }

    #[cfg(test)]
    pub(crate) fn issue_with_expiry(
        &self,
        payload: &ClaimPayload,
        kind: TokenKind,
        exp: i64,
    ) -> Result<String, AuthError> {
        let claims = SessionClaims {
            payload: payload.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: Utc::now().timestamp(),
            exp,
        };
        self.sign(&claims, kind)
    }
}
