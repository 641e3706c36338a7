//! Authentication
//!
//! Bearer JWTs signed with the configured HMAC secret. Credential checks
//! (passwords, SSO) happen upstream; this service only mints and verifies
//! access tokens.

use crate::error::{ApiError, ApiResult};
use crate::ApiState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tuition_common::{PersonId, TenantId};
use tuition_tenant::{Person, Role};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: PersonId,
    /// `None` for platform owners
    pub tenant_id: Option<TenantId>,
    pub role: Role,
    pub username: String,
    pub exp: usize,
}

/// Signs and verifies access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Token lifetime in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, person: &Person) -> ApiResult<String> {
        let expires = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ApiError::Internal("token expiry out of range".into()))?;
        let claims = Claims {
            sub: person.id,
            tenant_id: person.tenant,
            role: person.role,
            username: person.username.clone(),
            exp: expires.timestamp() as usize,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

/// Caller identity, taken from the bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: PersonId,
    pub tenant: Option<TenantId>,
    pub role: Role,
    pub username: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            tenant: claims.tenant_id,
            role: claims.role,
            username: claims.username,
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<ApiState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("expected a bearer token"))?;

        let user = AuthUser::from(state.tokens.verify(token.trim())?);
        // Tokens of removed people stop working
        match user.tenant {
            Some(tenant) => state.identity.get(tenant, user.id).map(|_| ()),
            None => Ok(()),
        }
        .map_err(|_| ApiError::unauthorized("unknown account"))?;

        Ok(user)
    }
}
