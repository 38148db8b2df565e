use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_attempts: u32,
    pub connect_retry_secs: u64,
}

impl DatabaseConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.connect_retry_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    pub users_csv: String,
    pub metrics_csv: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub ingest: IngestConfig,
}

impl AppConfig {
    /// Loads configuration from the environment. `DATABASE_URL` and
    /// `JWT_SECRET` are required, everything else has a default.
    pub fn from_env() -> anyhow::Result<Self> {
        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")?,
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            connect_attempts: std::env::var("DB_CONNECT_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            connect_retry_secs: std::env::var("DB_CONNECT_RETRY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
        };

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        };

        let ingest = IngestConfig {
            users_csv: std::env::var("USERS_CSV").unwrap_or_else(|_| "./data/users.csv".into()),
            metrics_csv: std::env::var("METRICS_CSV")
                .unwrap_or_else(|_| "./data/metrics.csv".into()),
        };

        Ok(Self {
            database,
            jwt,
            ingest,
        })
    }
}
