//! Online checkout - initiate an order, verify the callback, record payment

use crate::error::GatewayError;
use crate::provider::{OrderRequest, PaymentGateway, PaymentSignature};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tuition_billing::{BillingEngine, PaymentInput, PaymentMode, PaymentOutcome};
use tuition_common::money::{from_minor_units, to_minor_units};
use tuition_common::{InstallmentId, TenantId, TuitionError, TuitionResult};

/// What the browser needs to open the checkout widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutOrder {
    pub order_id: String,
    /// Minor units (paise)
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
    pub installment_id: InstallmentId,
}

/// Callback from the checkout widget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub installment_id: InstallmentId,
    /// Minor units (paise)
    pub amount: i64,
}

/// Checkout service
pub struct CheckoutService {
    billing: Arc<BillingEngine>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl CheckoutService {
    pub fn new(billing: Arc<BillingEngine>, gateway: Arc<dyn PaymentGateway>, currency: &str) -> Self {
        Self {
            billing,
            gateway,
            currency: currency.to_string(),
        }
    }

    /// Open a gateway order for whatever is still owed on the installment
    pub async fn initiate(&self, tenant: TenantId, installment: InstallmentId) -> TuitionResult<CheckoutOrder> {
        let installment = self.billing.get_installment(tenant, installment).await?;
        let remaining = installment.remaining();
        if remaining <= rust_decimal::Decimal::ZERO {
            return Err(TuitionError::AlreadyPaid);
        }

        let request = OrderRequest {
            amount: to_minor_units(remaining)?,
            currency: self.currency.clone(),
            receipt: format!("inst_{}", installment.id()),
        };
        let order = self.gateway.create_order(&request).await.map_err(|err| {
            tracing::warn!(tenant = %tenant, installment = %installment.id(), error = %err, "order creation failed");
            TuitionError::from(err)
        })?;

        tracing::info!(
            tenant = %tenant,
            installment = %installment.id(),
            order = %order.id,
            amount = order.amount,
            "checkout initiated"
        );
        Ok(CheckoutOrder {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            key_id: self.gateway.key_id().to_string(),
            installment_id: installment.id(),
        })
    }

    /// Check the callback signature, then record the payment.
    ///
    /// Nothing is written unless the signature verifies.
    pub async fn verify(&self, tenant: TenantId, request: VerifyRequest) -> TuitionResult<PaymentOutcome> {
        let signature = PaymentSignature {
            order_id: request.order_id.clone(),
            payment_id: request.payment_id.clone(),
            signature: request.signature.clone(),
        };
        if !self.gateway.verify_signature(&signature).await? {
            tracing::warn!(
                tenant = %tenant,
                order = %request.order_id,
                payment = %request.payment_id,
                "payment signature rejected"
            );
            return Err(GatewayError::InvalidSignature.into());
        }

        self.billing
            .record_payment(
                tenant,
                PaymentInput {
                    installment: request.installment_id,
                    amount: from_minor_units(request.amount),
                    mode: PaymentMode::Online,
                    transaction_ref: Some(request.payment_id),
                    paid_on: None,
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxGateway;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tuition_billing::{
        BillingInterval, FeeStructureCreate, InMemoryBillingRepository, InstallmentStatus, StudentContact,
        StudentDirectory,
    };
    use tuition_common::{BatchId, PersonId, StudentId};

    struct OneStudent(StudentId);

    impl StudentDirectory for OneStudent {
        fn contact(&self, _tenant: TenantId, student: StudentId) -> Option<StudentContact> {
            (student == self.0).then(|| StudentContact {
                student,
                person: PersonId::new(),
                full_name: "Rahul".into(),
                enrollment_number: "ENR-001".into(),
                phone: None,
                parents: vec![],
            })
        }

        fn batch_exists(&self, _tenant: TenantId, _batch: BatchId) -> bool {
            false
        }

        fn batch_students(&self, _tenant: TenantId, _batch: BatchId) -> Vec<StudentId> {
            vec![]
        }
    }

    /// Gateway that counts orders and always fails or always succeeds
    struct CountingGateway {
        orders: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PaymentGateway for CountingGateway {
        fn key_id(&self) -> &str {
            "rzp_test_counting"
        }

        async fn create_order(&self, request: &OrderRequest) -> crate::GatewayResult<crate::GatewayOrder> {
            self.orders.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GatewayError::Transport("connection refused".into()));
            }
            Ok(crate::GatewayOrder {
                id: "order_counting".into(),
                amount: request.amount,
                currency: request.currency.clone(),
            })
        }

        async fn verify_signature(&self, _signature: &PaymentSignature) -> crate::GatewayResult<bool> {
            Ok(false)
        }
    }

    async fn billing_with_installment(amount_due: rust_decimal::Decimal) -> (Arc<BillingEngine>, TenantId, InstallmentId) {
        let tenant = TenantId::new();
        let student = StudentId::new();
        let billing = Arc::new(BillingEngine::new(
            Arc::new(InMemoryBillingRepository::new()),
            Arc::new(OneStudent(student)),
        ));
        let structure = billing
            .create_fee_structure(
                tenant,
                FeeStructureCreate {
                    name: "Tuition".into(),
                    base_amount: dec!(1500),
                    interval: BillingInterval::Monthly,
                    batch: None,
                },
            )
            .await
            .unwrap();
        let allocation = billing.allocate_fee(tenant, student, structure.id, dec!(0)).await.unwrap();
        let installment = billing
            .create_installment(tenant, allocation.id(), NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(), amount_due)
            .await
            .unwrap();
        (billing, tenant, installment.id())
    }

    #[tokio::test]
    async fn test_initiate_and_verify() {
        let (billing, tenant, installment) = billing_with_installment(dec!(1500)).await;
        let sandbox = Arc::new(SandboxGateway::new("rzp_test_sandbox", "secret"));
        let checkout = CheckoutService::new(billing.clone(), sandbox.clone(), "INR");

        let order = checkout.initiate(tenant, installment).await.unwrap();
        assert_eq!(order.amount, 150_000);
        assert_eq!(order.currency, "INR");
        assert_eq!(order.key_id, "rzp_test_sandbox");
        assert!(order.order_id.starts_with("order_test_"));

        let outcome = checkout
            .verify(
                tenant,
                VerifyRequest {
                    signature: sandbox.sign(&order.order_id, "pay_abc"),
                    order_id: order.order_id.clone(),
                    payment_id: "pay_abc".into(),
                    installment_id: installment,
                    amount: order.amount,
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.payment.amount, dec!(1500));
        assert_eq!(outcome.payment.mode, PaymentMode::Online);
        assert_eq!(outcome.payment.transaction_ref.as_deref(), Some("pay_abc"));
        assert_eq!(outcome.installment.status(), InstallmentStatus::Paid);

        // Fully paid now: no second order
        assert!(matches!(checkout.initiate(tenant, installment).await, Err(TuitionError::AlreadyPaid)));
    }

    #[tokio::test]
    async fn test_initiate_charges_only_the_remainder() {
        let (billing, tenant, installment) = billing_with_installment(dec!(1000)).await;
        billing
            .record_payment(
                tenant,
                PaymentInput {
                    installment,
                    amount: dec!(250.50),
                    mode: PaymentMode::Cash,
                    transaction_ref: None,
                    paid_on: None,
                },
            )
            .await
            .unwrap();
        let checkout = CheckoutService::new(billing, Arc::new(SandboxGateway::new("k", "s")), "INR");

        assert_eq!(checkout.initiate(tenant, installment).await.unwrap().amount, 74_950);
    }

    #[tokio::test]
    async fn test_already_paid_creates_no_order() {
        let (billing, tenant, installment) = billing_with_installment(dec!(800)).await;
        billing
            .record_payment(
                tenant,
                PaymentInput {
                    installment,
                    amount: dec!(800),
                    mode: PaymentMode::Cash,
                    transaction_ref: None,
                    paid_on: None,
                },
            )
            .await
            .unwrap();

        let gateway = Arc::new(CountingGateway { orders: AtomicUsize::new(0), fail: false });
        let checkout = CheckoutService::new(billing, gateway.clone(), "INR");

        assert!(matches!(checkout.initiate(tenant, installment).await, Err(TuitionError::AlreadyPaid)));
        assert_eq!(gateway.orders.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_gateway_failure_propagates() {
        let (billing, tenant, installment) = billing_with_installment(dec!(800)).await;
        let gateway = Arc::new(CountingGateway { orders: AtomicUsize::new(0), fail: true });
        let checkout = CheckoutService::new(billing, gateway.clone(), "INR");

        assert!(matches!(checkout.initiate(tenant, installment).await, Err(TuitionError::Gateway(_))));
        assert_eq!(gateway.orders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bad_signature_records_nothing() {
        let (billing, tenant, installment) = billing_with_installment(dec!(800)).await;
        let gateway = Arc::new(CountingGateway { orders: AtomicUsize::new(0), fail: false });
        let checkout = CheckoutService::new(billing.clone(), gateway, "INR");

        let err = checkout
            .verify(
                tenant,
                VerifyRequest {
                    order_id: "order_counting".into(),
                    payment_id: "pay_forged".into(),
                    signature: "deadbeef".into(),
                    installment_id: installment,
                    amount: 80_000,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, TuitionError::Gateway(_)));
        assert!(billing.payments_for_installment(tenant, installment).await.unwrap().is_empty());
        assert_eq!(
            billing.get_installment(tenant, installment).await.unwrap().status(),
            InstallmentStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_oversized_verified_amount_is_a_validation_error() {
        let (billing, tenant, installment) = billing_with_installment(dec!(800)).await;
        let sandbox = Arc::new(SandboxGateway::new("rzp_test_sandbox", "secret"));
        let checkout = CheckoutService::new(billing.clone(), sandbox.clone(), "INR");

        let err = checkout
            .verify(
                tenant,
                VerifyRequest {
                    signature: sandbox.sign("order_test_1", "pay_big"),
                    order_id: "order_test_1".into(),
                    payment_id: "pay_big".into(),
                    installment_id: installment,
                    amount: i64::MAX,
                },
            )
            .await
            .unwrap_err();

        assert!(err.field_errors().unwrap().get("amount").is_some());
        assert!(billing.payments_for_installment(tenant, installment).await.unwrap().is_empty());
    }
}
