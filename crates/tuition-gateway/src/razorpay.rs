//! Razorpay REST client

use crate::error::{GatewayError, GatewayResult};
use crate::provider::{GatewayOrder, OrderRequest, PaymentGateway, PaymentSignature};
use crate::signature::SignatureVerifier;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Razorpay API base URL
pub const RAZORPAY_API: &str = "https://api.razorpay.com/v1";

/// Razorpay account settings
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl RazorpayConfig {
    pub fn new(key_id: &str, key_secret: &str) -> Self {
        Self {
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
            base_url: RAZORPAY_API.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Error body returned by the API
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    description: String,
}

/// Razorpay gateway
pub struct RazorpayGateway {
    config: RazorpayConfig,
    client: reqwest::Client,
    verifier: SignatureVerifier,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> GatewayResult<Self> {
        if config.key_id.is_empty() || config.key_secret.is_empty() {
            return Err(GatewayError::Config("razorpay key id and secret are required".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        let verifier = SignatureVerifier::new(&config.key_secret);

        Ok(Self { config, client, verifier })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> &str {
        &self.config.key_id
    }

    async fn create_order(&self, request: &OrderRequest) -> GatewayResult<GatewayOrder> {
        let response = self
            .client
            .post(self.url("orders"))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "razorpay order request failed");
                GatewayError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .map(|body| body.error.description)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or_default().to_string());
            tracing::warn!(status = status.as_u16(), %message, "razorpay rejected order");
            return Err(GatewayError::Provider { status: status.as_u16(), message });
        }

        let order: GatewayOrder = response.json().await?;
        tracing::info!(order = %order.id, amount = order.amount, "razorpay order created");
        Ok(order)
    }

    async fn verify_signature(&self, signature: &PaymentSignature) -> GatewayResult<bool> {
        Ok(self
            .verifier
            .verify(&signature.order_id, &signature.payment_id, &signature.signature))
    }
}
