use serde::{Deserialize, Deserializer, Serialize};
use time::{macros::format_description, Date};

/// Raw query options for GET /metrics, exactly as they arrive on the wire.
/// Clamping and allow-list checks happen in [`super::query::QuerySpec`].
#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    #[serde(default, deserialize_with = "optional_date")]
    pub start_date: Option<Date>,
    #[serde(default, deserialize_with = "optional_date")]
    pub end_date: Option<Date>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    100
}

/// Accepts `2024-01-31`. Browsers submit empty date inputs as empty strings,
/// which mean "no bound" rather than an error.
fn optional_date<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => parse_date(s).map(Some).map_err(serde::de::Error::custom),
    }
}

pub(crate) fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(s, &format)
}

/// Paging envelope returned by GET /metrics. `page` and `page_size` echo the
/// values actually used after clamping.
#[derive(Debug, Serialize)]
pub struct MetricsPage {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub data: Vec<MetricRow>,
}

/// One advertising performance row, shaped for the response. `cost_micros`
/// is populated for admin callers and omitted from the JSON entirely for
/// everyone else.
#[derive(Debug, Serialize)]
pub struct MetricRow {
    pub account_id: i64,
    pub campaign_id: i64,
    pub clicks: i64,
    pub conversions: f64,
    pub impressions: i64,
    pub interactions: i64,
    pub date: Date,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_micros: Option<i64>,
}
