use sqlx::{postgres::PgRow, PgPool, Row};

use super::{dto::MetricRow, query::QuerySpec};

/// Total rows matching the date filter.
pub async fn count(db: &PgPool, spec: &QuerySpec) -> Result<i64, sqlx::Error> {
    let sql = spec.count_sql();
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for date in spec.date_params() {
        query = query.bind(date);
    }

    query.fetch_one(db).await
}

/// One page of rows, projected according to the caller's rights.
pub async fn fetch_page(db: &PgPool, spec: &QuerySpec) -> Result<Vec<MetricRow>, sqlx::Error> {
    let sql = spec.page_sql();
    let mut query = sqlx::query(&sql);
    for date in spec.date_params() {
        query = query.bind(date);
    }

    let rows = query
        .bind(spec.page_size)
        .bind(spec.offset())
        .fetch_all(db)
        .await?;

    rows.iter()
        .map(|row| map_row(row, spec.include_cost))
        .collect()
}

fn map_row(row: &PgRow, include_cost: bool) -> Result<MetricRow, sqlx::Error> {
    Ok(MetricRow {
        account_id: row.try_get("account_id")?,
        campaign_id: row.try_get("campaign_id")?,
        clicks: row.try_get("clicks")?,
        conversions: row.try_get("conversions")?,
        impressions: row.try_get("impressions")?,
        interactions: row.try_get("interactions")?,
        date: row.try_get("date")?,
        cost_micros: if include_cost {
            Some(row.try_get("cost_micros")?)
        } else {
            None
        },
    })
}
