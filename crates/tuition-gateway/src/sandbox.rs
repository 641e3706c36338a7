//! Offline gateway for development and tests
//!
//! Orders never leave the process. Signatures are still checked with the
//! configured secret, so an unsigned callback is rejected here exactly as
//! it would be in production.

use crate::error::GatewayResult;
use crate::provider::{GatewayOrder, OrderRequest, PaymentGateway, PaymentSignature};
use crate::signature::SignatureVerifier;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sandbox gateway
pub struct SandboxGateway {
    key_id: String,
    verifier: SignatureVerifier,
    next_order: AtomicU64,
}

impl SandboxGateway {
    pub fn new(key_id: &str, secret: &str) -> Self {
        Self {
            key_id: key_id.to_string(),
            verifier: SignatureVerifier::new(secret),
            next_order: AtomicU64::new(1),
        }
    }

    /// Sign a payment the way the provider would, for local checkout flows
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        self.verifier.sign(order_id, payment_id)
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn create_order(&self, request: &OrderRequest) -> GatewayResult<GatewayOrder> {
        let n = self.next_order.fetch_add(1, Ordering::Relaxed);
        let order = GatewayOrder {
            id: format!("order_test_{}", n),
            amount: request.amount,
            currency: request.currency.clone(),
        };
        tracing::debug!(order = %order.id, receipt = %request.receipt, "sandbox order created");
        Ok(order)
    }

    async fn verify_signature(&self, signature: &PaymentSignature) -> GatewayResult<bool> {
        Ok(self
            .verifier
            .verify(&signature.order_id, &signature.payment_id, &signature.signature))
    }
}
