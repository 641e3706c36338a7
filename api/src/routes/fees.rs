//! Fee structures, allocations and installments

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::permissions::{ensure_visible, require, visible_students};
use crate::middleware::tenant::TenantScope;
use crate::{models::*, ApiState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tuition_billing::{AllocationSummary, FeeAllocation, FeeStructure, FeeStructureCreate, Installment};
use tuition_common::{AllocationId, FeeStructureId, StudentId};
use tuition_tenant::Operation;
use uuid::Uuid;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/fees/structures", get(list_structures).post(create_structure))
        .route("/fees/structures/:id/allocate-batch", post(allocate_batch))
        .route("/fees/allocations", get(list_allocations).post(allocate))
        .route("/fees/allocations/:id/discount", put(update_discount))
        .route("/fees/allocations/:id/deactivate", post(deactivate_allocation))
        .route("/fees/allocations/:id/schedule", post(schedule))
        .route("/fees/allocations/:id/summary", get(allocation_summary))
        .route("/fees/installments", get(list_installments).post(create_installment))
}

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

// ============ Structures ============

pub async fn list_structures(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
) -> ApiResult<Json<ApiResponse<Vec<FeeStructure>>>> {
    require(&scope.user, Operation::ViewFees)?;
    Ok(Json(ApiResponse::success(state.billing.list_structures(scope.tenant).await?)))
}

pub async fn create_structure(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiJson(input): ApiJson<FeeStructureCreate>,
) -> ApiResult<Created<FeeStructure>> {
    require(&scope.user, Operation::ManageFees)?;
    let structure = state.billing.create_fee_structure(scope.tenant, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(structure))))
}

pub async fn allocate_batch(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Created<Vec<FeeAllocation>>> {
    require(&scope.user, Operation::ManageFees)?;
    let allocations = state
        .billing
        .allocate_batch_defaults(scope.tenant, FeeStructureId::from(id))
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(allocations))))
}

// ============ Allocations ============

#[derive(Deserialize)]
pub struct StudentFilter {
    student: Option<StudentId>,
}

pub async fn list_allocations(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiQuery(filter): ApiQuery<StudentFilter>,
) -> ApiResult<Json<ApiResponse<Vec<FeeAllocation>>>> {
    require(&scope.user, Operation::ViewFees)?;
    if let Some(student) = filter.student {
        ensure_visible(&state, &scope, student)?;
    }
    let mut allocations = state.billing.list_allocations(scope.tenant, filter.student).await?;
    if let Some(visible) = visible_students(&state, &scope) {
        allocations.retain(|a| visible.contains(&a.student()));
    }
    Ok(Json(ApiResponse::success(allocations)))
}

#[derive(Deserialize)]
pub struct AllocationCreate {
    student: StudentId,
    fee_structure: FeeStructureId,
    #[serde(default)]
    discount: Decimal,
}

pub async fn allocate(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiJson(input): ApiJson<AllocationCreate>,
) -> ApiResult<Created<FeeAllocation>> {
    require(&scope.user, Operation::ManageFees)?;
    let allocation = state
        .billing
        .allocate_fee(scope.tenant, input.student, input.fee_structure, input.discount)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(allocation))))
}

#[derive(Deserialize)]
pub struct DiscountUpdate {
    discount: Decimal,
}

pub async fn update_discount(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<DiscountUpdate>,
) -> ApiResult<Json<ApiResponse<FeeAllocation>>> {
    require(&scope.user, Operation::ManageFees)?;
    let allocation = state
        .billing
        .update_discount(scope.tenant, AllocationId::from(id), input.discount)
        .await?;
    Ok(Json(ApiResponse::success(allocation)))
}

pub async fn deactivate_allocation(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<FeeAllocation>>> {
    require(&scope.user, Operation::ManageFees)?;
    let allocation = state
        .billing
        .deactivate_allocation(scope.tenant, AllocationId::from(id))
        .await?;
    Ok(Json(ApiResponse::success(allocation)))
}

#[derive(Deserialize)]
pub struct ScheduleRequest {
    first_due: NaiveDate,
    count: u32,
}

pub async fn schedule(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ScheduleRequest>,
) -> ApiResult<Created<Vec<Installment>>> {
    require(&scope.user, Operation::ManageFees)?;
    let installments = state
        .billing
        .schedule_installments(scope.tenant, AllocationId::from(id), input.first_due, input.count)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(installments))))
}

pub async fn allocation_summary(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<AllocationSummary>>> {
    require(&scope.user, Operation::ViewFees)?;
    let allocation = state.billing.get_allocation(scope.tenant, AllocationId::from(id)).await?;
    ensure_visible(&state, &scope, allocation.student())?;
    let summary = state.billing.allocation_summary(scope.tenant, allocation.id()).await?;
    Ok(Json(ApiResponse::success(summary)))
}

// ============ Installments ============

pub async fn list_installments(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiQuery(filter): ApiQuery<StudentFilter>,
) -> ApiResult<Json<ApiResponse<Vec<Installment>>>> {
    require(&scope.user, Operation::ViewFees)?;
    let students = match (filter.student, visible_students(&state, &scope)) {
        (Some(student), _) => {
            ensure_visible(&state, &scope, student)?;
            Some(vec![student])
        }
        (None, visible) => visible,
    };
    let installments = state
        .billing
        .list_installments(scope.tenant, students.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(installments)))
}

#[derive(Deserialize)]
pub struct InstallmentCreate {
    allocation: AllocationId,
    due_date: NaiveDate,
    amount_due: Decimal,
}

pub async fn create_installment(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiJson(input): ApiJson<InstallmentCreate>,
) -> ApiResult<Created<Installment>> {
    require(&scope.user, Operation::ManageFees)?;
    let installment = state
        .billing
        .create_installment(scope.tenant, input.allocation, input.due_date, input.amount_due)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(installment))))
}
