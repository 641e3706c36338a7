//! API Models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tuition_billing::{Installment, Payment, PaymentMode};
use tuition_common::{FieldErrors, InstallmentId};
use tuition_tenant::{Person, Tenant, TenantSignup};
use utoipa::ToSchema;

/// Standard API response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn failure(error: ErrorResponse) -> Self {
        Self { success: false, data: None, error: Some(error) }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// Field-level messages for validation and conflict errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<FieldErrors>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: FieldErrors) -> Self {
        self.details = Some(details);
        self
    }
}

// ============ Onboarding ============

/// Institute signup
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub institute_name: String,
    /// Subdomain label, e.g. `galaxy`
    pub subdomain: String,
    pub admin_username: String,
    pub admin_email: String,
    #[serde(default)]
    pub admin_full_name: String,
}

impl From<SignupRequest> for TenantSignup {
    fn from(request: SignupRequest) -> Self {
        TenantSignup {
            institute_name: request.institute_name,
            subdomain: request.subdomain,
            admin_username: request.admin_username,
            admin_email: request.admin_email,
            admin_full_name: request.admin_full_name,
        }
    }
}

/// Signup result
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub tenant: Tenant,
    pub admin: Person,
    pub access_token: String,
}

/// Minted access token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

// ============ Payments ============

/// Start an online payment
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InitiatePaymentRequest {
    #[schema(value_type = String, format = Uuid)]
    pub installment_id: InstallmentId,
}

/// Checkout callback
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    #[schema(value_type = String, format = Uuid)]
    pub installment_id: InstallmentId,
    /// Minor units (paise)
    pub amount: i64,
}

/// Verified payment
#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub status: &'static str,
    pub payment: Payment,
    pub installment: Installment,
}

/// Cash or cheque collected at the desk
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ManualPaymentRequest {
    #[schema(value_type = String, format = Uuid)]
    pub installment: InstallmentId,
    pub amount: Decimal,
    /// CASH, ONLINE or CHEQUE
    #[serde(default)]
    #[schema(value_type = String)]
    pub mode: PaymentMode,
    #[serde(default)]
    pub transaction_ref: Option<String>,
    /// Defaults to today
    #[serde(default)]
    pub paid_on: Option<NaiveDate>,
}
