//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration (identity provider token validation).
    pub jwt: JwtSettings,
    /// Vision extraction provider configuration.
    pub extraction: ExtractionSettings,
    /// Billing provider webhook configuration.
    pub billing: BillingSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// JWT validation settings.
///
/// Tokens are minted by the external identity provider; this backend only
/// validates them.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Shared secret used to verify token signatures.
    pub secret: String,
}

/// Vision extraction provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSettings {
    /// Provider endpoint URL.
    pub endpoint: String,
    /// API key for the provider.
    pub api_key: String,
    /// Model identifier to request.
    #[serde(default = "default_extraction_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_extraction_timeout")]
    pub timeout_secs: u64,
}

fn default_extraction_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_extraction_timeout() -> u64 {
    30
}

/// Billing provider webhook settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingSettings {
    /// Shared secret expected in the webhook signature header.
    pub webhook_secret: String,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DANKPASS").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
