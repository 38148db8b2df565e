use sqlx::PgPool;
use time::Date;
use tracing::{info, warn};

use crate::metrics::dto::parse_date;

/// One validated row from the metrics CSV.
#[derive(Debug)]
struct MetricRecord {
    account_id: i64,
    campaign_id: i64,
    cost_micros: i64,
    clicks: i64,
    conversions: f64,
    impressions: i64,
    interactions: i64,
    date: Date,
}

#[derive(Debug)]
struct Columns {
    account_id: usize,
    campaign_id: usize,
    cost_micros: usize,
    clicks: usize,
    conversions: usize,
    impressions: usize,
    interactions: usize,
    date: usize,
}

impl Columns {
    fn locate(header: &str) -> Option<Columns> {
        let names: Vec<&str> = header.split(',').map(str::trim).collect();
        let position = |name: &str| names.iter().position(|n| *n == name);
        Some(Columns {
            account_id: position("account_id")?,
            campaign_id: position("campaign_id")?,
            cost_micros: position("cost_micros")?,
            clicks: position("clicks")?,
            conversions: position("conversions")?,
            impressions: position("impressions")?,
            interactions: position("interactions")?,
            date: position("date")?,
        })
    }
}

/// Seeds the metrics table from CSV. The import only runs against an empty
/// table: metric rows carry no natural key to dedupe on, so re-running it
/// against a populated table would double every figure.
pub async fn import(db: &PgPool, path: &str) {
    let existing: i64 = match sqlx::query_scalar("SELECT COUNT(*) FROM metrics")
        .fetch_one(db)
        .await
    {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, "could not inspect metrics table, skipping import");
            return;
        }
    };
    if existing > 0 {
        info!(existing, "metrics table already populated, skipping import");
        return;
    }

    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path, error = %e, "metrics csv not readable, skipping import");
            return;
        }
    };

    let mut lines = contents.lines();
    let Some(header) = lines.next() else {
        warn!(path, "metrics csv is empty");
        return;
    };
    let Some(columns) = Columns::locate(header) else {
        warn!(path, header, "metrics csv is missing required columns");
        return;
    };

    let mut imported = 0u64;
    let mut skipped = 0u64;
    for (index, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let record = match parse_row(line, &columns) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = index + 2, error = %e, "skipping metric row");
                skipped += 1;
                continue;
            }
        };

        if let Err(e) = insert(db, &record).await {
            warn!(line = index + 2, error = %e, "failed to insert metric row");
            skipped += 1;
        } else {
            imported += 1;
        }
    }

    info!(path, imported, skipped, "metrics import finished");
}

fn parse_row(line: &str, columns: &Columns) -> anyhow::Result<MetricRecord> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let field = |index: usize| {
        fields
            .get(index)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("row has {} fields, need {}", fields.len(), index + 1))
    };

    Ok(MetricRecord {
        account_id: parse_count(field(columns.account_id)?)?,
        campaign_id: parse_count(field(columns.campaign_id)?)?,
        cost_micros: parse_count(field(columns.cost_micros)?)?,
        clicks: parse_count(field(columns.clicks)?)?,
        conversions: parse_measure(field(columns.conversions)?)?,
        impressions: parse_count(field(columns.impressions)?)?,
        interactions: parse_count(field(columns.interactions)?)?,
        date: parse_date(field(columns.date)?)?,
    })
}

/// Non-negative integer cell. Empty cells count as zero, and exports that
/// write whole numbers as floats ("42.0") are tolerated.
fn parse_count(field: &str) -> anyhow::Result<i64> {
    if field.is_empty() {
        return Ok(0);
    }
    if let Ok(n) = field.parse::<i64>() {
        anyhow::ensure!(n >= 0, "negative value {n}");
        return Ok(n);
    }

    let value: f64 = field.parse()?;
    anyhow::ensure!(value >= 0.0, "negative value {value}");
    Ok(value.round() as i64)
}

/// Non-negative float cell; empty counts as zero.
fn parse_measure(field: &str) -> anyhow::Result<f64> {
    if field.is_empty() {
        return Ok(0.0);
    }
    let value: f64 = field.parse()?;
    anyhow::ensure!(value >= 0.0, "negative value {value}");
    Ok(value)
}

async fn insert(db: &PgPool, record: &MetricRecord) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO metrics
            (account_id, campaign_id, cost_micros, clicks, conversions,
             impressions, interactions, date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(record.account_id)
    .bind(record.campaign_id)
    .bind(record.cost_micros)
    .bind(record.clicks)
    .bind(record.conversions)
    .bind(record.impressions)
    .bind(record.interactions)
    .bind(record.date)
    .execute(db)
    .await?;

    Ok(())
}
