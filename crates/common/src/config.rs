//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Trigger authorization configuration.
    pub trigger: TriggerConfig,
    /// Advancement engine tuning.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on a single request, tick included.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Signing algorithm accepted for trigger identity tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum JwtAlgorithm {
    /// Shared-secret HMAC.
    #[serde(rename = "HS256")]
    Hs256,
    /// RSA public key.
    #[default]
    #[serde(rename = "RS256")]
    Rs256,
}

/// Configuration for verifying the callers of the cron endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerConfig {
    /// Expected `aud` claim of scheduler identity tokens.
    pub audience: String,
    /// Suffix the service account's local part must carry, including the `@`.
    #[serde(default = "default_scheduler_email_suffix")]
    pub scheduler_email_suffix: String,
    /// Domain suffix of service-account emails.
    #[serde(default = "default_service_account_domain")]
    pub service_account_domain: String,
    /// Token signing algorithm.
    #[serde(default)]
    pub jwt_algorithm: JwtAlgorithm,
    /// HMAC secret (HS256 only).
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// PEM-encoded RSA public key (RS256 only).
    #[serde(default)]
    pub jwt_public_key_pem: Option<String>,
    /// Accepted issuers. Empty accepts any issuer.
    #[serde(default)]
    pub issuers: Vec<String>,
    /// Whether an administrator's session token may trigger a tick.
    #[serde(default = "default_true")]
    pub allow_admin_override: bool,
}

/// Advancement engine tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Minimum spacing between two election ticks of the same kind.
    #[serde(default = "default_election_min_interval")]
    pub election_min_interval_secs: u64,
    /// Minimum spacing between two bill ticks.
    #[serde(default = "default_tick_min_interval")]
    pub bill_min_interval_secs: u64,
    /// Minimum spacing between two economy ticks.
    #[serde(default = "default_tick_min_interval")]
    pub economy_min_interval_secs: u64,
    /// Seed for tie-break randomness. `None` uses the thread RNG.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            election_min_interval_secs: default_election_min_interval(),
            bill_min_interval_secs: default_tick_min_interval(),
            economy_min_interval_secs: default_tick_min_interval(),
            random_seed: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_request_timeout() -> u64 {
    300
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_scheduler_email_suffix() -> String {
    "-scheduler@".to_string()
}

fn default_service_account_domain() -> String {
    ".iam.gserviceaccount.com".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_election_min_interval() -> u64 {
    12 * 60 * 60
}

const fn default_tick_min_interval() -> u64 {
    30 * 60
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `POLITY_ENV`)
    /// 3. Environment variables with `POLITY_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("POLITY_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("POLITY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("trigger.issuers")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("POLITY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config = parse(
            r#"
            [database]
            url = "postgres://localhost/polity"

            [trigger]
            audience = "https://polity.example.com"
            "#,
        );

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_secs, 300);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.trigger.jwt_algorithm, JwtAlgorithm::Rs256);
        assert_eq!(config.trigger.scheduler_email_suffix, "-scheduler@");
        assert!(config.trigger.allow_admin_override);
        assert_eq!(config.engine.election_min_interval_secs, 43_200);
        assert_eq!(config.engine.bill_min_interval_secs, 1800);
        assert!(config.engine.random_seed.is_none());
    }

    #[test]
    fn test_hs256_and_seed() {
        let config = parse(
            r#"
            [database]
            url = "postgres://localhost/polity"

            [trigger]
            audience = "polity"
            jwt_algorithm = "HS256"
            jwt_secret = "s3cret"
            issuers = ["https://accounts.google.com"]
            allow_admin_override = false

            [engine]
            random_seed = 42
            economy_min_interval_secs = 0
            "#,
        );

        assert_eq!(config.trigger.jwt_algorithm, JwtAlgorithm::Hs256);
        assert_eq!(config.trigger.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.trigger.issuers.len(), 1);
        assert!(!config.trigger.allow_admin_override);
        assert_eq!(config.engine.random_seed, Some(42));
        assert_eq!(config.engine.economy_min_interval_secs, 0);
    }
}
