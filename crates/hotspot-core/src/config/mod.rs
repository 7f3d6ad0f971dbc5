//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files plus environment overrides. Each sub-module represents a
//! logical configuration section, and every field carries a default so an
//! empty configuration is valid for development.

pub mod app;
pub mod auth;
pub mod coa;
pub mod logging;
pub mod realtime;
pub mod termination;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::coa::CoaConfig;
pub use self::logging::LoggingConfig;
pub use self::realtime::RealtimeConfig;
pub use self::termination::TerminationConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Token verification settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Disconnect-Request client settings.
    #[serde(default)]
    pub coa: CoaConfig,
    /// Termination coordination settings.
    #[serde(default)]
    pub termination: TerminationConfig,
    /// Real-time event settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Accounting database; the registry runs without persistence when absent.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Accounting database connection pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl AppConfig {
    /// Load configuration for the given environment name.
    ///
    /// Merges `config/default.toml`, an optional `config/{env}.toml` overlay,
    /// and environment variables prefixed with `HOTSPOT__` (sections are
    /// separated by a double underscore, e.g. `HOTSPOT__COA__SECRET`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("HOTSPOT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.coa.secret.is_empty() {
            return Err(AppError::configuration("coa.secret must not be empty"));
        }
        if self.coa.timeout_ms == 0 {
            return Err(AppError::configuration("coa.timeout_ms must be positive"));
        }
        if self.termination.max_concurrency == 0 {
            return Err(AppError::configuration(
                "termination.max_concurrency must be positive",
            ));
        }
        if self.realtime.channel_buffer_size == 0 {
            return Err(AppError::configuration(
                "realtime.channel_buffer_size must be positive",
            ));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }
        Ok(())
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.coa.default_port, 3799);
        assert_eq!(config.termination.max_concurrency, 8);
        assert!(config.database.is_none());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = AppConfig::default();
        config.termination.max_concurrency = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let raw = r#"
            [coa]
            secret = "s3cret"
            max_retries = 4

            [database]
            url = "postgres://radius@localhost/radius"
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.coa.secret, "s3cret");
        assert_eq!(config.coa.max_retries, 4);
        assert_eq!(config.coa.timeout_ms, 3000);
        assert_eq!(config.database.unwrap().max_connections, 10);
        assert_eq!(config.server.port, 8080);
    }
}
