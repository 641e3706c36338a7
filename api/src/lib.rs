//! Tuition ERP API
//!
//! REST surface over the tenant, academic, billing and gateway engines.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              REST API                                   │
//! │   TraceLayer │ CORS │ Bearer JWT │ X-Tenant / Host → TenantId │ roles   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌─────────────┐  │
//! │  │   Tenants    │  │  Academics   │  │   Billing    │  │  Checkout   │  │
//! │  │  & People    │  │   Registry   │  │    Engine    │  │  (gateway)  │  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └─────────────┘  │
//! │                                                                         │
//! │  every engine call names the resolved tenant; no route spans two        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;

use crate::config::{AppConfig, GatewayProvider, DEV_JWT_SECRET};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tuition_academics::AcademicRegistry;
use tuition_billing::{BillingEngine, InMemoryBillingRepository, ReceiptRenderer, TextReceiptRenderer};
use tuition_common::TenantId;
use tuition_gateway::{CheckoutService, PaymentGateway, RazorpayConfig, RazorpayGateway, SandboxGateway};
use tuition_tenant::{IdentityRegistry, TenantDirectory, TenantLifecycle};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use middleware::auth::{AuthUser, Claims, TokenIssuer};
pub use middleware::tenant::{TenantScope, TENANT_HEADER};
pub use models::*;

const SANDBOX_KEY_ID: &str = "rzp_test_sandbox";
const SANDBOX_KEY_SECRET: &str = "sandbox-secret";

/// API state
pub struct ApiState {
    /// API version
    pub version: String,
    pub directory: Arc<TenantDirectory>,
    pub identity: Arc<IdentityRegistry>,
    pub lifecycle: TenantLifecycle,
    pub academics: Arc<AcademicRegistry>,
    pub billing: Arc<BillingEngine>,
    pub checkout: CheckoutService,
    pub tokens: TokenIssuer,
    pub receipts: Arc<dyn ReceiptRenderer>,
    /// Receipt heading override
    pub institute_name: Option<String>,
}

impl ApiState {
    /// Wire the engines together around a payment gateway
    pub fn new(tokens: TokenIssuer, gateway: Arc<dyn PaymentGateway>, currency: &str) -> Self {
        let directory = Arc::new(TenantDirectory::new());
        let identity = Arc::new(IdentityRegistry::new());
        let academics = Arc::new(AcademicRegistry::new(identity.clone()));
        let billing = Arc::new(BillingEngine::new(
            Arc::new(InMemoryBillingRepository::new()),
            academics.clone(),
        ));

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            lifecycle: TenantLifecycle::new(directory.clone(), identity.clone()),
            checkout: CheckoutService::new(billing.clone(), gateway, currency),
            directory,
            identity,
            academics,
            billing,
            tokens,
            receipts: Arc::new(TextReceiptRenderer),
            institute_name: None,
        }
    }

    /// Build from configuration. Fails when the chosen gateway is missing
    /// its keys, or when development defaults are used outside dev mode.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        check_secrets(config)?;
        let gateway = &config.gateway;
        let provider: Arc<dyn PaymentGateway> = match gateway.provider {
            GatewayProvider::Razorpay => Arc::new(RazorpayGateway::new(RazorpayConfig {
                key_id: gateway.key_id.clone(),
                key_secret: gateway.key_secret.clone(),
                base_url: gateway.base_url.clone(),
                timeout: Duration::from_secs(gateway.timeout_secs),
            })?),
            GatewayProvider::Sandbox => Arc::new(SandboxGateway::new(
                non_empty(&gateway.key_id).unwrap_or(SANDBOX_KEY_ID),
                non_empty(&gateway.key_secret).unwrap_or(SANDBOX_KEY_SECRET),
            )),
        };
        tracing::info!(provider = ?gateway.provider, currency = %gateway.currency, "payment gateway ready");

        let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl_hours);
        let mut state = Self::new(tokens, provider, &gateway.currency);
        state.institute_name = config.receipts.institute_name.clone();
        Ok(state)
    }

    /// Heading printed on a tenant's receipts
    pub fn receipt_heading(&self, tenant: TenantId) -> String {
        self.institute_name
            .clone()
            .or_else(|| self.directory.get(tenant).map(|t| t.name))
            .unwrap_or_default()
    }
}

/// Refuse publicly known secrets unless running in dev mode
fn check_secrets(config: &AppConfig) -> anyhow::Result<()> {
    let dev_secret = non_empty(&config.auth.jwt_secret).map_or(true, |s| s == DEV_JWT_SECRET);
    let sandbox = config.gateway.provider == GatewayProvider::Sandbox;

    if config.server.dev_mode {
        if dev_secret {
            tracing::warn!("dev mode: access tokens signed with the built-in secret");
        }
        if sandbox {
            tracing::warn!("dev mode: sandbox gateway, payments are never charged");
        }
        return Ok(());
    }
    if dev_secret {
        anyhow::bail!("auth.jwt_secret is unset or the built-in development secret; set TUITION__AUTH__JWT_SECRET or run with --dev");
    }
    if sandbox {
        anyhow::bail!("the sandbox gateway accepts locally signed callbacks; configure gateway.provider = \"razorpay\" or run with --dev");
    }
    Ok(())
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value).filter(|v| !v.trim().is_empty())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tuition ERP API",
        version = "1.0.0",
        description = "Multi-tenant institute management: academics, fees and payments",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::tenants::signup,
        routes::users::issue_token,
        routes::payments::record_payment,
        routes::payments::initiate_payment,
        routes::payments::verify_payment,
        routes::reports::due_list,
        routes::reports::collections,
        routes::receipts::download_receipt,
    ),
    components(
        schemas(
            ErrorResponse,
            SignupRequest, TokenResponse,
            InitiatePaymentRequest, VerifyPaymentRequest, ManualPaymentRequest,
            routes::health::HealthResponse
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "tenants", description = "Institute onboarding"),
        (name = "users", description = "People and access tokens"),
        (name = "payments", description = "Manual and online payments"),
        (name = "reports", description = "Due list and collections"),
        (name = "receipts", description = "Receipt downloads")
    )
)]
pub struct ApiDoc;

/// Build the API router
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<Arc<ApiState>> {
    Router::new()
        .merge(routes::tenants::router())
        .merge(routes::users::router())
        .merge(routes::academics::router())
        .merge(routes::fees::router())
        .merge(routes::payments::router())
        .merge(routes::reports::router())
        .merge(routes::receipts::router())
        .merge(routes::dashboard::router())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::defaults().unwrap()
    }

    #[test]
    fn test_defaults_refused_outside_dev_mode() {
        let err = ApiState::from_config(&config()).err().unwrap();
        assert!(err.to_string().contains("jwt_secret"));

        let mut custom_secret = config();
        custom_secret.auth.jwt_secret = "a-long-random-production-secret".into();
        let err = ApiState::from_config(&custom_secret).err().unwrap();
        assert!(err.to_string().contains("sandbox"));
    }

    #[test]
    fn test_dev_mode_accepts_defaults() {
        let mut dev = config();
        dev.server.dev_mode = true;
        assert!(ApiState::from_config(&dev).is_ok());
    }

    #[test]
    fn test_razorpay_with_real_secrets_starts() {
        let mut live = config();
        live.auth.jwt_secret = "a-long-random-production-secret".into();
        live.gateway.provider = GatewayProvider::Razorpay;
        live.gateway.key_id = "rzp_live_key".into();
        live.gateway.key_secret = "live-secret".into();
        assert!(ApiState::from_config(&live).is_ok());

        live.gateway.key_secret = String::new();
        assert!(ApiState::from_config(&live).is_err());
    }
}
