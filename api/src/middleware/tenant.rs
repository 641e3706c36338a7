//! Tenant resolution
//!
//! The partition comes from the `X-Tenant` header (a subdomain slug) or,
//! failing that, the left-most label of `Host`. A non-owner may only act
//! inside the institute their token was issued for.

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::ApiState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::HOST;
use axum::http::request::Parts;
use std::sync::Arc;
use tuition_common::{TenantId, TuitionError};
use tuition_tenant::Role;

/// Header carrying the tenant slug
pub const TENANT_HEADER: &str = "x-tenant";

/// Authenticated caller bound to a resolved tenant
#[derive(Debug, Clone)]
pub struct TenantScope {
    pub tenant: TenantId,
    pub user: AuthUser,
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for TenantScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<ApiState>) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        let tenant = match (header(parts, TENANT_HEADER), header(parts, HOST.as_str())) {
            (Some(slug), _) => state.directory.resolve(slug)?,
            (None, Some(host)) => state.directory.resolve_host(host)?,
            (None, None) => return Err(TuitionError::not_found("tenant", "").into()),
        };

        if user.role != Role::Owner && user.tenant != Some(tenant) {
            tracing::warn!(user = %user.id, tenant = %tenant, "cross-tenant request refused");
            return Err(ApiError::forbidden());
        }
        Ok(Self { tenant, user })
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}
