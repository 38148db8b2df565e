use std::{future::Future, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::config::DatabaseConfig;

/// Runs `operation` up to `attempts` times with a fixed `delay` between
/// tries, returning the first success or the last error once every attempt
/// is spent. The delay is only slept between attempts, never after the
/// final failure.
pub async fn with_retry<T, F, Fut>(
    attempts: u32,
    delay: Duration,
    what: &str,
    mut operation: F,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let attempts = attempts.max(1);
    let mut last_err = None;

    for attempt in 1..=attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(what, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => {
                if attempt < attempts {
                    warn!(what, attempt, max_attempts = attempts, error = %e, "attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("no attempts were made")))
        .with_context(|| format!("{what} failed after {attempts} attempts"))
}

/// Opens the connection pool, retrying while the database comes up.
pub async fn connect_with_retry(cfg: &DatabaseConfig) -> anyhow::Result<PgPool> {
    with_retry(
        cfg.connect_attempts,
        cfg.retry_delay(),
        "database connect",
        || async move {
            let pool = PgPoolOptions::new()
                .max_connections(cfg.max_connections)
                .connect(&cfg.url)
                .await?;
            Ok(pool)
        },
    )
    .await
}
