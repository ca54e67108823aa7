//! # Application Configuration
//!
//! Environment-sourced configuration with development defaults. The
//! webhook secret is redacted from `Debug` output.

use std::path::PathBuf;

use crate::auth::SecretToken;

/// Service configuration, built from the environment once at startup.
#[derive(Clone)]
pub struct AppConfig {
    /// Listen host (`HOST`, default `127.0.0.1`).
    pub host: String,
    /// Listen port (`PORT`, default `3001`).
    pub port: u16,
    /// Shared secret for webhook authentication (`WEBHOOK_SECRET`).
    /// `None` disables authentication — development only.
    pub webhook_secret: Option<SecretToken>,
    /// Durable snapshot location (`DB_PATH`, default `./receipts.json`).
    pub db_path: PathBuf,
    /// Base URL used to construct public receipt links
    /// (`PUBLIC_BASE_URL`, default `http://localhost:3001`).
    pub public_base_url: String,
    /// Watched contract's deployer address (`CONTRACT_ADDRESS`).
    /// Informational — the store does no on-chain verification.
    pub contract_address: String,
    /// Watched contract's name (`CONTRACT_NAME`). Informational.
    pub contract_name: String,
}

impl AppConfig {
    /// Build configuration from the environment, falling back to the
    /// development defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or("HOST", defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            webhook_secret: std::env::var("WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .map(SecretToken::new)
                .or(defaults.webhook_secret),
            db_path: std::env::var("DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            public_base_url: env_or("PUBLIC_BASE_URL", defaults.public_base_url),
            contract_address: env_or("CONTRACT_ADDRESS", defaults.contract_address),
            contract_name: env_or("CONTRACT_NAME", defaults.contract_name),
        }
    }

    /// Fully-qualified contract identifier, for startup logging.
    pub fn contract_id(&self) -> String {
        format!("{}.{}", self.contract_address, self.contract_name)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            webhook_secret: Some(SecretToken::new("dev-webhook-secret")),
            db_path: PathBuf::from("./receipts.json"),
            public_base_url: "http://localhost:3001".to_string(),
            contract_address: "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM".to_string(),
            contract_name: "proof-of-action".to_string(),
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("db_path", &self.db_path)
            .field("public_base_url", &self.public_base_url)
            .field("contract_address", &self.contract_address)
            .field("contract_name", &self.contract_name)
            .finish()
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_development_setup() {
        let config = AppConfig::default();
        assert_eq!(config.port, 3001);
        assert_eq!(config.db_path, PathBuf::from("./receipts.json"));
        assert!(config.webhook_secret.is_some());
        assert_eq!(config.contract_name, "proof-of-action");
    }

    #[test]
    fn contract_id_joins_address_and_name() {
        let config = AppConfig::default();
        assert!(config.contract_id().ends_with(".proof-of-action"));
    }

    #[test]
    fn debug_redacts_webhook_secret() {
        let rendered = format!("{:?}", AppConfig::default());
        assert!(!rendered.contains("dev-webhook-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
