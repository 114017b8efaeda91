use crate::error::{AppError, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub jwt: JwtConfig,
    pub s3: S3Config,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket: String,
    pub assets_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| AppError::ConfigError(format!("{} not set", key)))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server: ServerConfig {
                host: or_default("HOST", "0.0.0.0"),
                port: or_default("PORT", "3000")
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid PORT value".to_string()))?,
                max_body_size: or_default("MAX_BODY_SIZE", "10485760")
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid MAX_BODY_SIZE value".to_string()))?,
            },
            database: DatabaseConfig {
                url: required("DB_URL")?,
                max_connections: or_default("DB_MAX_CONNECTIONS", "20").parse().map_err(|_| {
                    AppError::ConfigError("Invalid DB_MAX_CONNECTIONS value".to_string())
                })?,
            },
            cors: CorsConfig {
                allowed_origins: required("FRONTEND_URL")?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                ttl_days: or_default("JWT_TTL_DAYS", "7")
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid JWT_TTL_DAYS value".to_string()))?,
            },
            s3: S3Config {
                access_key_id: required("AWS_ACCESS_KEY_ID")?,
                secret_access_key: required("AWS_SECRET_ACCESS_KEY")?,
                region: or_default("AWS_REGION", "ap-southeast-1"),
                bucket: required("S3_BUCKET")?,
                assets_url: required("ASSETS_URL")?.trim_end_matches('/').to_string(),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
