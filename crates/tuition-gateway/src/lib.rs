//! Payment Gateway Adapter
//!
//! Turns a payment intent into an external order and verifies completion
//! callbacks before the billing engine records anything.
//!
//! ```text
//!  initiate(installment)                      verify(callback)
//!        │                                          │
//!        ▼                                          ▼
//!  remaining > 0 ? ──no──► AlreadyPaid       HMAC(order|payment) ok ? ──no──► Gateway error
//!        │ yes                                      │ yes
//!        ▼                                          ▼
//!  PaymentGateway::create_order            BillingEngine::record_payment (Online)
//! ```

pub mod checkout;
pub mod error;
pub mod provider;
pub mod razorpay;
pub mod sandbox;
pub mod signature;

pub use checkout::{CheckoutOrder, CheckoutService, VerifyRequest};
pub use error::{GatewayError, GatewayResult};
pub use provider::{GatewayOrder, OrderRequest, PaymentGateway, PaymentSignature};
pub use razorpay::{RazorpayConfig, RazorpayGateway};
pub use sandbox::SandboxGateway;
pub use signature::SignatureVerifier;
