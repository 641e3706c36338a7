//! People of an institute

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::auth::AuthUser;
use crate::middleware::permissions::require;
use crate::middleware::tenant::TenantScope;
use crate::{models::*, ApiState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tuition_common::{PersonId, TenantId};
use tuition_tenant::{operations_for, Operation, Person, PersonCreate, Role};
use uuid::Uuid;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/me", get(me))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id/token", post(issue_token))
}

#[derive(Deserialize)]
pub struct ListParams {
    role: Option<Role>,
}

/// New member of the institute
#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub role: Role,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Current caller
#[derive(Debug, Serialize)]
pub struct Me {
    pub id: PersonId,
    pub username: String,
    pub role: Role,
    pub tenant: Option<TenantId>,
    /// Absent for owners minted outside this process
    pub person: Option<Person>,
    pub operations: Vec<Operation>,
}

pub async fn me(State(state): State<Arc<ApiState>>, user: AuthUser) -> Json<ApiResponse<Me>> {
    let person = match user.tenant {
        Some(tenant) => state.identity.get(tenant, user.id).ok(),
        None => state.identity.get_owner(user.id).ok(),
    };
    Json(ApiResponse::success(Me {
        id: user.id,
        username: user.username,
        role: user.role,
        tenant: user.tenant,
        person,
        operations: operations_for(user.role),
    }))
}

pub async fn list_users(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<ApiResponse<Vec<Person>>>> {
    require(&scope.user, Operation::ViewPeople)?;
    Ok(Json(ApiResponse::success(state.identity.list(scope.tenant, params.role))))
}

pub async fn create_user(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiJson(input): ApiJson<UserCreate>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Person>>)> {
    require(&scope.user, Operation::ManagePeople)?;
    let person = state.identity.register(PersonCreate {
        tenant: Some(scope.tenant),
        role: input.role,
        username: input.username,
        full_name: input.full_name,
        email: input.email,
        phone: input.phone,
    })?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(person))))
}

/// Mint an access token for a member
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/token",
    params(("id" = Uuid, Path, description = "Person ID")),
    responses(
        (status = 200, description = "Access token", body = TokenResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "No such person in this institute", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn issue_token(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<TokenResponse>>> {
    require(&scope.user, Operation::ManagePeople)?;
    let person = state.identity.get(scope.tenant, PersonId::from(id))?;
    let access_token = state.tokens.issue(&person)?;
    tracing::info!(tenant = %scope.tenant, person = %person.id, by = %scope.user.id, "access token issued");
    Ok(Json(ApiResponse::success(TokenResponse {
        access_token,
        token_type: "Bearer".into(),
        expires_in: state.tokens.ttl_seconds(),
    })))
}
