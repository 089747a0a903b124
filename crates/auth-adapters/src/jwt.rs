//! HS256 bearer tokens carrying `{sub, role, schoolId?, iat, exp}`.

use chrono::{Duration, Utc};
use domains::{Actor, DomainError, DomainResult, Role, TokenVerifier};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<Uuid>,
    pub iat: i64,
    pub exp: i64,
}

impl From<Claims> for Actor {
    fn from(claims: Claims) -> Self {
        Actor::new(claims.sub, claims.role, claims.school_id)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret must not be empty")]
    EmptySecret,
    #[error("failed to sign token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

pub struct JwtAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAuthority {
    pub fn new(secret: &SecretString) -> Result<Self, TokenError> {
        let bytes = secret.expose_secret().as_bytes();
        if bytes.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation: Validation::new(Algorithm::HS256),
        })
    }

    /// Mints a token for `actor` valid for `ttl`.
    pub fn issue(&self, actor: &Actor, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: actor.id,
            role: actor.role,
            school_id: actor.school_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn claims(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}

impl TokenVerifier for JwtAuthority {
    fn verify(&self, token: &str) -> DomainResult<Actor> {
        match self.claims(token) {
            Ok(claims) => Ok(claims.into()),
            Err(err) => {
                tracing::debug!(error = %err, "rejected bearer token");
                Err(DomainError::Unauthenticated("Invalid or expired token".into()))
            }
        }
    }
}
