//! Institute onboarding and platform administration

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::AuthUser;
use crate::middleware::permissions::require;
use crate::{models::*, ApiState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tuition_common::TenantId;
use tuition_tenant::{Operation, Tenant};
use uuid::Uuid;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/tenants", get(list_tenants))
        .route("/tenants/:id/deactivate", post(deactivate_tenant))
}

/// Register an institute and its first administrator
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Institute created; returns tenant, admin and access token"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Subdomain or username taken", body = ErrorResponse)
    ),
    tag = "tenants"
)]
pub async fn signup(
    State(state): State<Arc<ApiState>>,
    ApiJson(input): ApiJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SignupResponse>>)> {
    let (tenant, admin) = state.lifecycle.onboard(input.into())?;
    let access_token = state.tokens.issue(&admin)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(SignupResponse { tenant, admin, access_token })),
    ))
}

pub async fn list_tenants(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<Tenant>>>> {
    require(&user, Operation::ManageTenants)?;
    Ok(Json(ApiResponse::success(state.directory.list())))
}

pub async fn deactivate_tenant(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Tenant>>> {
    require(&user, Operation::ManageTenants)?;
    let tenant = state.lifecycle.deactivate(TenantId::from(id))?;
    tracing::info!(tenant = %tenant.id, by = %user.id, "institute deactivated");
    Ok(Json(ApiResponse::success(tenant)))
}
