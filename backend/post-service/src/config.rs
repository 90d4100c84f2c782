/// Configuration management for Post Service
///
/// Everything is read from environment variables; `main` loads a `.env` file
/// first when one is present.
use db_pool::DbConfig;
use std::str::FromStr;

pub const SERVICE_NAME: &str = "post-service";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
}

/// Application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!(
                "POST_STORE must be 'postgres' or 'memory', got '{}'",
                other
            )),
        }
    }
}

/// Which store backs the service. The pool config is only read for Postgres.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database: Option<DbConfig>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// RSA public key used to verify bearer tokens
    pub public_key_pem: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                Err(_) => "http://localhost:3000".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let backend = match std::env::var("POST_STORE") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::Postgres,
        };
        if production && backend == StorageBackend::Memory {
            return Err("POST_STORE=memory is not allowed in production".to_string());
        }
        let database = match backend {
            StorageBackend::Postgres => Some(DbConfig::from_env(SERVICE_NAME)?),
            StorageBackend::Memory => None,
        };

        let public_key_pem = std::env::var("JWT_PUBLIC_KEY_PEM")
            .map_err(|_| "JWT_PUBLIC_KEY_PEM environment variable not set".to_string())?;

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("POST_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("POST_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            cors,
            storage: StorageConfig { backend, database },
            jwt: JwtConfig { public_key_pem },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}
