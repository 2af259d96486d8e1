use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub policy: PolicyConfig,
    pub api: ApiConfig,
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; only ever read from the DATABASE_URL env var.
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Signing secret; only ever read from the JWT_SECRET env var.
    pub jwt_secret: String,
    /// Lifetime of issued tokens. Distinct from the cookie lifetime.
    pub token_ttl_hours: u64,
    /// Lifetime of the cookie carrying the token.
    pub cookie_ttl_hours: u64,
    pub cookie_secure: bool,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

/// Deployment choices for the two routes whose access policy varies:
/// who may register accounts, and who may submit raw sensor readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// When false, POST /api/register requires an Admin token.
    pub open_registration: bool,
    /// When false, POST /api/weather requires a Sensor or Admin token.
    pub open_sensor_ingest: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Include collaborator error detail in 5xx response bodies.
    pub expose_error_details: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Students whose last login is older than this are swept. None disables.
    pub student_inactivity_days: Option<i64>,
    pub sweep_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Environment preset first, then individual env var overrides
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs =
                v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }

        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_TOKEN_TTL_HOURS") {
            self.security.token_ttl_hours = v.parse().unwrap_or(self.security.token_ttl_hours);
        }
        if let Ok(v) = env::var("SECURITY_COOKIE_TTL_HOURS") {
            self.security.cookie_ttl_hours = v.parse().unwrap_or(self.security.cookie_ttl_hours);
        }
        if let Ok(v) = env::var("SECURITY_COOKIE_SECURE") {
            self.security.cookie_secure = v.parse().unwrap_or(self.security.cookie_secure);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        if let Ok(v) = env::var("POLICY_OPEN_REGISTRATION") {
            self.policy.open_registration = v.parse().unwrap_or(self.policy.open_registration);
        }
        if let Ok(v) = env::var("POLICY_OPEN_SENSOR_INGEST") {
            self.policy.open_sensor_ingest = v.parse().unwrap_or(self.policy.open_sensor_ingest);
        }

        if let Ok(v) = env::var("API_EXPOSE_ERROR_DETAILS") {
            self.api.expose_error_details = v.parse().unwrap_or(self.api.expose_error_details);
        }

        if let Ok(v) = env::var("RETENTION_STUDENT_INACTIVITY_DAYS") {
            self.retention.student_inactivity_days = v.parse().ok();
        }
        if let Ok(v) = env::var("RETENTION_SWEEP_INTERVAL_SECS") {
            self.retention.sweep_interval_secs =
                v.parse().unwrap_or(self.retention.sweep_interval_secs);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                acquire_timeout_secs: 30,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                token_ttl_hours: 1,
                cookie_ttl_hours: 1,
                cookie_secure: false,
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            policy: PolicyConfig {
                open_registration: true,
                open_sensor_ingest: true,
            },
            api: ApiConfig {
                expose_error_details: true,
            },
            retention: RetentionConfig {
                student_inactivity_days: None,
                sweep_interval_secs: 24 * 60 * 60,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                acquire_timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                token_ttl_hours: 1,
                cookie_ttl_hours: 1,
                cookie_secure: true,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            policy: PolicyConfig {
                open_registration: false,
                open_sensor_ingest: true,
            },
            api: ApiConfig {
                expose_error_details: false,
            },
            retention: RetentionConfig {
                student_inactivity_days: Some(30),
                sweep_interval_secs: 24 * 60 * 60,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                acquire_timeout_secs: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                token_ttl_hours: 1,
                cookie_ttl_hours: 1,
                cookie_secure: true,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            policy: PolicyConfig {
                open_registration: false,
                open_sensor_ingest: false,
            },
            api: ApiConfig {
                expose_error_details: false,
            },
            retention: RetentionConfig {
                student_inactivity_days: Some(30),
                sweep_interval_secs: 24 * 60 * 60,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_are_open() {
        let config = AppConfig::development();
        assert!(config.policy.open_registration);
        assert!(config.policy.open_sensor_ingest);
        assert!(config.api.expose_error_details);
        assert!(!config.security.cookie_secure);
    }

    #[test]
    fn production_defaults_are_closed() {
        let config = AppConfig::production();
        assert!(!config.policy.open_registration);
        assert!(!config.policy.open_sensor_ingest);
        assert!(!config.api.expose_error_details);
        assert!(config.security.cookie_secure);
        assert_eq!(config.retention.student_inactivity_days, Some(30));
    }

    #[test]
    fn token_and_cookie_lifetimes_are_independent() {
        let mut config = AppConfig::development();
        config.security.token_ttl_hours = 2;
        config.security.cookie_ttl_hours = 8;
        assert_ne!(
            config.security.token_ttl_hours,
            config.security.cookie_ttl_hours
        );
    }
}
