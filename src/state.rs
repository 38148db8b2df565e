use std::sync::Arc;

use sqlx::PgPool;

use crate::{config::AppConfig, db};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect_with_retry(&config.database).await?;
        Ok(Self { db, config })
    }
}
