//! Admin reports

use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::middleware::permissions::require;
use crate::middleware::tenant::TenantScope;
use crate::{models::*, ApiState};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tuition_billing::{CollectionSummary, DueListRow};
use tuition_tenant::Operation;
use utoipa::IntoParams;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/reports/due_list", get(due_list))
        .route("/reports/collections", get(collections))
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DueListParams {
    /// Defaults to today
    as_of: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CollectionParams {
    /// Defaults to today
    date: Option<NaiveDate>,
}

/// Unpaid installments due on or before a date
#[utoipa::path(
    get,
    path = "/api/v1/reports/due_list",
    params(DueListParams),
    responses(
        (status = 200, description = "Due installments, earliest first; overdue rows labelled"),
        (status = 403, description = "Not an administrator", body = ErrorResponse)
    ),
    tag = "reports",
    security(("bearer" = []))
)]
pub async fn due_list(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiQuery(params): ApiQuery<DueListParams>,
) -> ApiResult<Json<ApiResponse<Vec<DueListRow>>>> {
    require(&scope.user, Operation::ViewDueList)?;
    let as_of = params.as_of.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(ApiResponse::success(state.billing.due_list(scope.tenant, as_of).await?)))
}

/// Money collected on a day
#[utoipa::path(
    get,
    path = "/api/v1/reports/collections",
    params(CollectionParams),
    responses(
        (status = 200, description = "Totals by payment mode"),
        (status = 403, description = "Not an administrator", body = ErrorResponse)
    ),
    tag = "reports",
    security(("bearer" = []))
)]
pub async fn collections(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiQuery(params): ApiQuery<CollectionParams>,
) -> ApiResult<Json<ApiResponse<CollectionSummary>>> {
    require(&scope.user, Operation::ViewCollections)?;
    let date = params.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(ApiResponse::success(
        state.billing.collection_summary(scope.tenant, date).await?,
    )))
}
