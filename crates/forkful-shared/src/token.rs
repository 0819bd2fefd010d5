//! Signed credential tokens.
//!
//! A token is `base64url(claims JSON) "." base64url(Ed25519 signature)`, the
//! signature covering the first segment. The server holds the signing key;
//! everything a protected handler needs (user id, role, restaurant id) is in
//! the claims.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::Credential;
use crate::constants::TOKEN_TTL_DAYS;
use crate::error::{KeyError, TokenError};
use crate::identity::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<Uuid>,
    /// Issued at, unix seconds.
    pub iat: i64,
    /// Not before, unix seconds.
    pub nbf: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

impl Claims {
    pub fn credential(&self) -> Credential {
        Credential {
            user_id: self.sub,
            role: self.role,
            restaurant_id: self.restaurant_id,
        }
    }
}

/// Issues and verifies tokens with a single Ed25519 key.
#[derive(Clone)]
pub struct TokenSigner {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("verifying_key", &hex::encode(self.verifying_key.to_bytes()))
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenSigner {
    pub fn new(signing_key: SigningKey, ttl: Duration) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
            ttl,
        }
    }

    /// Random key, valid only for the lifetime of this process.
    pub fn generate() -> Self {
        Self::new(SigningKey::generate(&mut OsRng), Duration::days(TOKEN_TTL_DAYS))
    }

    /// Load a 32-byte secret from 64 hex characters.
    pub fn from_hex(secret_hex: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(secret_hex.trim())?;
        let secret: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::Length(bytes.len()))?;
        Ok(Self::new(
            SigningKey::from_bytes(&secret),
            Duration::days(TOKEN_TTL_DAYS),
        ))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        role: Role,
        restaurant_id: Option<Uuid>,
    ) -> Result<String, TokenError> {
        self.issue_at(user_id, role, restaurant_id, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: Uuid,
        role: Role,
        restaurant_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user_id,
            role,
            restaurant_id,
            iat,
            nbf: iat,
            exp: (now + self.ttl).timestamp(),
        };
        self.encode(&claims)
    }

    /// Sign arbitrary claims.
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let payload = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;
        let head = URL_SAFE_NO_PAD.encode(payload);
        let signature = self.signing_key.sign(head.as_bytes());
        Ok(format!(
            "{head}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Check signature first, then the validity window against `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Missing);
        }

        let (head, sig) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let sig_bytes = URL_SAFE_NO_PAD
            .decode(sig)
            .map_err(|_| TokenError::Malformed)?;
        let signature = Signature::from_slice(&sig_bytes).map_err(|_| TokenError::Malformed)?;

        self.verifying_key
            .verify(head.as_bytes(), &signature)
            .map_err(|_| TokenError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(head)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        let now = now.timestamp();
        if now < claims.nbf {
            return Err(TokenError::NotYetValid);
        }
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
