//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use forkful_shared::constants::{DEFAULT_HTTP_PORT, MAX_IMAGE_SIZE, TOKEN_TTL_DAYS};
use forkful_shared::identity::normalize_email;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8890`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./forkful.db`
    pub database_path: PathBuf,

    /// Directory where menu images are written.
    /// Env: `UPLOAD_PATH`
    /// Default: `./uploads`
    pub upload_path: PathBuf,

    /// Maximum menu image size in bytes (5 MiB).
    pub max_image_size: usize,

    /// The single email address that registers as `admin`. Normalized.
    /// Env: `ADMIN_EMAIL`
    /// Default: none (nobody can become admin).
    pub admin_email: Option<String>,

    /// Ed25519 secret for credential tokens, 64 hex chars.
    /// Env: `TOKEN_SIGNING_KEY`
    /// Default: none (a random key is generated per process).
    pub token_signing_key: Option<String>,

    /// Credential lifetime.
    pub token_ttl: Duration,

    /// Include internal error text in 500 responses.
    /// Env: `APP_ENV=development`
    pub dev_mode: bool,

    /// Also accept the deprecated `x-auth-token` header.
    /// Env: `LEGACY_AUTH_HEADER` (true/false)
    /// Default: `false`
    pub legacy_auth_header: bool,

    /// Sustained requests per second per IP on the credential endpoints.
    pub auth_rate: f64,

    /// Burst allowance per IP on the credential endpoints.
    pub auth_burst: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./forkful.db"),
            upload_path: PathBuf::from("./uploads"),
            max_image_size: MAX_IMAGE_SIZE,
            admin_email: None,
            token_signing_key: None,
            token_ttl: Duration::days(TOKEN_TTL_DAYS),
            dev_mode: false,
            legacy_auth_header: false,
            auth_rate: 1.0,
            auth_burst: 10.0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Tests pass a map instead of touching the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.is_empty()) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("UPLOAD_PATH").filter(|p| !p.is_empty()) {
            config.upload_path = PathBuf::from(path);
        }

        if let Some(email) = lookup("ADMIN_EMAIL") {
            let email = normalize_email(&email);
            if !email.is_empty() {
                config.admin_email = Some(email);
            }
        }

        if let Some(key) = lookup("TOKEN_SIGNING_KEY") {
            if is_hex_secret(&key) {
                config.token_signing_key = Some(key.trim().to_string());
            } else {
                tracing::warn!("Invalid TOKEN_SIGNING_KEY (expected 64 hex chars), using a random key");
            }
        }

        if let Some(env) = lookup("APP_ENV") {
            config.dev_mode = env.eq_ignore_ascii_case("development");
        }

        if let Some(val) = lookup("LEGACY_AUTH_HEADER") {
            match parse_bool(&val) {
                Some(b) => config.legacy_auth_header = b,
                None => tracing::warn!(value = %val, "Invalid LEGACY_AUTH_HEADER, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn is_hex_secret(value: &str) -> bool {
    let value = value.trim();
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
}
