//! Tuition ERP API server
//!
//! # Usage
//!
//! ```bash
//! tuition-api                                    # serve
//! tuition-api serve
//! tuition-api --dev serve                        # built-in secrets, sandbox gateway
//! tuition-api --dev owner-token --username root  # print a platform owner token
//! ```

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tuition_api::config::AppConfig;
use tuition_api::{build_router, ApiState};
use tuition_tenant::{PersonCreate, Role};

#[derive(Parser)]
#[command(name = "tuition-api")]
#[command(version)]
#[command(about = "Tuition ERP API server", long_about = None)]
struct Cli {
    /// Development mode: accept the built-in token secret and the sandbox gateway
    #[arg(long, global = true, env = "TUITION_DEV")]
    dev: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Mint an access token for a platform owner
    OwnerToken {
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "owner@localhost")]
        email: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    config.server.dev_mode |= cli.dev;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log.filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::OwnerToken { username, email } => {
            let state = ApiState::from_config(&config)?;
            let owner = state.identity.register(PersonCreate {
                tenant: None,
                role: Role::Owner,
                username,
                full_name: String::new(),
                email,
                phone: None,
            })?;
            println!("{}", state.tokens.issue(&owner)?);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = Arc::new(ApiState::from_config(&config)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!("Tuition API listening on {}", config.server.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
