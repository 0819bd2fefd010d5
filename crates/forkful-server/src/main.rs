//! # forkful-server
//!
//! REST backend for the Forkful restaurant-ordering service.
//!
//! This binary provides:
//! - **Accounts**: registration (owners together with their first
//!   restaurant), login and credential verification
//! - **Catalog**: restaurants and menu items, with image uploads
//! - **Orders**: server-priced order placement, the status lifecycle and
//!   soft cancellation, scoped to the customer or the restaurant owner
//! - **Per-IP rate limiting** on the credential endpoints

mod api;
mod config;
mod credential;
mod error;
mod image_store;
mod rate_limit;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use forkful_shared::token::TokenSigner;
use forkful_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::image_store::ImageStore;
use crate::rate_limit::RateLimiter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,forkful_server=debug,forkful_store=info")
        }))
        .init();

    info!("Starting Forkful server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        http_addr = %config.http_addr,
        database = %config.database_path.display(),
        uploads = %config.upload_path.display(),
        admin_configured = config.admin_email.is_some(),
        dev_mode = config.dev_mode,
        legacy_auth_header = config.legacy_auth_header,
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let db = Database::open_at(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;

    let tokens = match config.token_signing_key.as_deref() {
        Some(hex) => TokenSigner::from_hex(hex)?,
        None => {
            warn!("TOKEN_SIGNING_KEY not set; credentials will not survive a restart");
            TokenSigner::generate()
        }
    }
    .with_ttl(config.token_ttl);

    let images = ImageStore::new(config.upload_path.clone(), config.max_image_size).await?;

    let rate_limiter = RateLimiter::new(config.auth_rate, config.auth_burst);

    let http_addr = config.http_addr;
    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        tokens: Arc::new(tokens),
        images: Arc::new(images),
        rate_limiter: rate_limiter.clone(),
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Every 5 minutes, evict buckets idle for more than 10 minutes.
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.purge_stale(600.0).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
