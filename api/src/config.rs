//! Server configuration
//!
//! Layered: built-in defaults, then an optional TOML file (`TUITION_CONFIG`,
//! default `tuition.toml`), then `TUITION__SECTION__KEY` environment
//! variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Environment variable naming the config file
pub const CONFIG_PATH_VAR: &str = "TUITION_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "tuition.toml";

/// Token secret shipped as a default. Only accepted in development mode.
pub const DEV_JWT_SECRET: &str = "tuition-dev-secret-change-me";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub receipts: ReceiptConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Allow the built-in token secret and the sandbox gateway
    #[serde(default)]
    pub dev_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

/// Which payment provider backs online checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayProvider {
    /// Offline orders, real signature checks
    Sandbox,
    Razorpay,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub provider: GatewayProvider,
    /// Required for razorpay; the sandbox falls back to test keys
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
    pub currency: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiptConfig {
    /// Heading printed on receipts; the tenant's name when unset
    #[serde(default)]
    pub institute_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl AppConfig {
    /// Load from defaults, file and environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::builder()?
            .add_source(File::with_name(&path).required(false))
            .add_source(Environment::with_prefix("TUITION").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Defaults only; no file, no environment
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.bind_addr", "0.0.0.0:8080")?
            .set_default("server.dev_mode", false)?
            .set_default("auth.jwt_secret", DEV_JWT_SECRET)?
            .set_default("auth.token_ttl_hours", 8_i64)?
            .set_default("gateway.provider", "sandbox")?
            .set_default("gateway.key_id", "")?
            .set_default("gateway.key_secret", "")?
            .set_default("gateway.base_url", tuition_gateway::razorpay::RAZORPAY_API)?
            .set_default("gateway.currency", "INR")?
            .set_default("gateway.timeout_secs", 15_i64)?
            .set_default("log.filter", "info,tower_http=debug")
    }
}
