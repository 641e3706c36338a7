//! Receipt downloads

use crate::error::ApiResult;
use crate::extract::ApiPath;
use crate::middleware::permissions::{ensure_visible, require};
use crate::middleware::tenant::TenantScope;
use crate::ApiState;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tuition_billing::Receipt;
use tuition_common::{InstallmentId, PaymentId};
use tuition_tenant::Operation;
use uuid::Uuid;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/receipts/:payment_id", get(download_receipt))
        .route("/installments/:id/receipt", get(latest_receipt))
}

/// Download the receipt of a payment
#[utoipa::path(
    get,
    path = "/api/v1/receipts/{payment_id}",
    params(("payment_id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Receipt document"),
        (status = 403, description = "Not the paying student, their parent or an administrator"),
        (status = 404, description = "Payment not found")
    ),
    tag = "receipts",
    security(("bearer" = []))
)]
pub async fn download_receipt(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiPath(payment_id): ApiPath<Uuid>,
) -> ApiResult<Response> {
    require(&scope.user, Operation::DownloadReceipt)?;
    let receipt = state.billing.receipt(scope.tenant, PaymentId::from(payment_id)).await?;
    render(&state, &scope, receipt)
}

/// Receipt of the latest payment against an installment
pub async fn latest_receipt(
    State(state): State<Arc<ApiState>>,
    scope: TenantScope,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Response> {
    require(&scope.user, Operation::DownloadReceipt)?;
    let receipt = state
        .billing
        .latest_receipt_for_installment(scope.tenant, InstallmentId::from(id))
        .await?;
    render(&state, &scope, receipt)
}

fn render(state: &ApiState, scope: &TenantScope, receipt: Receipt) -> ApiResult<Response> {
    ensure_visible(state, scope, receipt.student)?;

    let body = state.receipts.render(&state.receipt_heading(scope.tenant), &receipt)?;
    let disposition = format!(
        "attachment; filename=\"receipt_{}.{}\"",
        receipt.number,
        state.receipts.extension()
    );
    tracing::debug!(tenant = %scope.tenant, receipt = %receipt.number, "receipt rendered");
    Ok((
        [
            (CONTENT_TYPE, state.receipts.content_type().to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
