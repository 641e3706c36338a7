//! Payment gateway capability

use crate::error::GatewayResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Order to open with the provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    /// Minor units (paise)
    pub amount: i64,
    pub currency: String,
    /// Our reference, e.g. `inst_<installment id>`
    pub receipt: String,
}

/// Order as created by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// What the checkout widget hands back after a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSignature {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// External payment provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key the checkout widget is opened with
    fn key_id(&self) -> &str;

    /// Open an order for the amount
    async fn create_order(&self, request: &OrderRequest) -> GatewayResult<GatewayOrder>;

    /// Whether the provider really signed this payment
    async fn verify_signature(&self, signature: &PaymentSignature) -> GatewayResult<bool>;
}
