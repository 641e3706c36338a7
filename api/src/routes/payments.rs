//! Payments: desk collection and online checkout

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::middleware::permissions::{ensure_visible, require, visible_students};
use crate::middleware::tenant::TenantScope;
use crate::{models::*, ApiState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tuition_billing::{Payment, PaymentInput, PaymentOutcome};
use tuition_common::InstallmentId;
use tuition_gateway::{CheckoutOrder, VerifyRequest};
use tuition_tenant::Operation;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/payments", get(list_payments).post(record_payment))
        .route("/pay/initiate", post(initiate_payment))
        .route("/pay/verify", post(verify_payment))
}

pub async fn list_payments(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
) -> ApiResult<Json<ApiResponse<Vec<Payment>>>> {
    require(&scope.user, Operation::ViewFees)?;
    let visible = visible_students(&state, &scope);
    let payments = state.billing.list_payments(scope.tenant, visible.as_deref()).await?;
    Ok(Json(ApiResponse::success(payments)))
}

/// Record a payment collected by staff
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    request_body = ManualPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded; returns the payment and the recomputed installment"),
        (status = 400, description = "Invalid amount or mode", body = ErrorResponse),
        (status = 403, description = "Role may not record payments", body = ErrorResponse),
        (status = 404, description = "Installment not found", body = ErrorResponse)
    ),
    tag = "payments",
    security(("bearer" = []))
)]
pub async fn record_payment(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiJson(input): ApiJson<ManualPaymentRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PaymentOutcome>>)> {
    require(&scope.user, Operation::RecordPayment)?;
    let outcome = state
        .billing
        .record_payment(
            scope.tenant,
            PaymentInput {
                installment: input.installment,
                amount: input.amount,
                mode: input.mode,
                transaction_ref: input.transaction_ref,
                paid_on: input.paid_on,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome))))
}

/// Start an online payment for what is left on an installment
#[utoipa::path(
    post,
    path = "/api/v1/pay/initiate",
    request_body = InitiatePaymentRequest,
    responses(
        (status = 200, description = "Gateway order: order_id, amount (paise), currency, key_id"),
        (status = 400, description = "Fee already paid", body = ErrorResponse),
        (status = 500, description = "Gateway error", body = ErrorResponse)
    ),
    tag = "payments",
    security(("bearer" = []))
)]
pub async fn initiate_payment(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiJson(input): ApiJson<InitiatePaymentRequest>,
) -> ApiResult<Json<ApiResponse<CheckoutOrder>>> {
    require(&scope.user, Operation::PayOnline)?;
    check_payer(&state, &scope, input.installment_id).await?;
    let order = state.checkout.initiate(scope.tenant, input.installment_id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Verify the checkout callback and record the payment
#[utoipa::path(
    post,
    path = "/api/v1/pay/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified and recorded"),
        (status = 500, description = "Signature rejected or recording failed", body = ErrorResponse)
    ),
    tag = "payments",
    security(("bearer" = []))
)]
pub async fn verify_payment(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiJson(input): ApiJson<VerifyPaymentRequest>,
) -> ApiResult<Json<ApiResponse<VerifyPaymentResponse>>> {
    require(&scope.user, Operation::PayOnline)?;
    check_payer(&state, &scope, input.installment_id).await?;
    let outcome = state
        .checkout
        .verify(
            scope.tenant,
            VerifyRequest {
                order_id: input.order_id,
                payment_id: input.payment_id,
                signature: input.signature,
                installment_id: input.installment_id,
                amount: input.amount,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(VerifyPaymentResponse {
        status: "success",
        payment: outcome.payment,
        installment: outcome.installment,
    })))
}

/// Students and parents may only pay their own bills
async fn check_payer(state: &ApiState, scope: &TenantScope, installment: InstallmentId) -> ApiResult<()> {
    let installment = state.billing.get_installment(scope.tenant, installment).await?;
    ensure_visible(state, scope, installment.student())
}
