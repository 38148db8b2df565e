use sqlx::PgPool;
use tracing::info;

use crate::config::IngestConfig;

mod metrics;
mod users;

/// One-time startup routine: make sure the schema exists, then seed both
/// tables from CSV. Schema failures abort startup; import problems are
/// logged per row and never take the service down.
pub async fn run(db: &PgPool, cfg: &IngestConfig) -> anyhow::Result<()> {
    ensure_schema(db).await?;
    users::import(db, &cfg.users_csv).await;
    metrics::import(db, &cfg.metrics_csv).await;
    Ok(())
}

async fn ensure_schema(db: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('admin', 'user')),
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS metrics (
            id BIGSERIAL PRIMARY KEY,
            account_id BIGINT NOT NULL,
            campaign_id BIGINT NOT NULL,
            cost_micros BIGINT NOT NULL,
            clicks BIGINT NOT NULL,
            conversions DOUBLE PRECISION NOT NULL,
            impressions BIGINT NOT NULL,
            interactions BIGINT NOT NULL,
            date DATE NOT NULL
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_metrics_date ON metrics (date)")
        .execute(db)
        .await?;

    info!("schema ready");
    Ok(())
}
