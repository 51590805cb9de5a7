use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

/// Secret used when running in development without `JWT_SECRET`.
pub const DEVELOPMENT_JWT_SECRET: &str = "notes-api-development-secret";

/// Longest accepted token lifetime: one leap year.
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 366;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. `None` selects the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    /// Report another user's note as missing instead of "not authorized".
    pub conceal_foreign_notes: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("NOTES_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("SECURITY_CONCEAL_FOREIGN_NOTES") {
            self.security.conceal_foreign_notes = v.parse().unwrap_or(self.security.conceal_foreign_notes);
        }

        if self.security.jwt_secret.is_empty() && self.environment == Environment::Development {
            tracing::warn!("JWT_SECRET not set; using the development signing secret");
            self.security.jwt_secret = DEVELOPMENT_JWT_SECRET.to_string();
        }

        self
    }

    /// Fails when the configuration cannot be served safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.environment != Environment::Development
            && self.security.jwt_secret == DEVELOPMENT_JWT_SECRET
        {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: "the development secret cannot be used outside development",
            });
        }
        if self.security.jwt_expiry_hours == 0
            || self.security.jwt_expiry_hours > MAX_JWT_EXPIRY_HOURS
        {
            return Err(ConfigError::Invalid {
                key: "SECURITY_JWT_EXPIRY_HOURS",
                reason: "must be between 1 and 8784 (one year)",
            });
        }
        if self.api.max_request_size_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: "API_MAX_REQUEST_SIZE_BYTES",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                conceal_foreign_notes: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                conceal_foreign_notes: false,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                conceal_foreign_notes: false,
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration for {key}: {reason}")]
    Invalid {
        key: &'static str,
        reason: &'static str,
    },
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 5000);
        assert!(config.database.url.is_none());
        assert!(config.api.enable_request_logging);
        assert!(!config.security.conceal_foreign_notes);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.security.jwt_expiry_hours, 4);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn empty_secret_fails_validation() {
        let config = AppConfig::production();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn development_secret_rejected_outside_development() {
        let mut config = AppConfig::staging();
        config.security.jwt_secret = DEVELOPMENT_JWT_SECRET.to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { key: "JWT_SECRET", .. })));

        let mut config = AppConfig::development();
        config.security.jwt_secret = DEVELOPMENT_JWT_SECRET.to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn token_lifetime_is_bounded() {
        let mut config = AppConfig::development();
        config.security.jwt_secret = "secret".to_string();
        for hours in [0, MAX_JWT_EXPIRY_HOURS + 1, u64::MAX / 2] {
            config.security.jwt_expiry_hours = hours;
            assert!(
                matches!(
                    config.validate(),
                    Err(ConfigError::Invalid { key: "SECURITY_JWT_EXPIRY_HOURS", .. })
                ),
                "hours {}",
                hours
            );
        }
        config.security.jwt_expiry_hours = MAX_JWT_EXPIRY_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let mut config = AppConfig::development();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 8080;
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }
}
