use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{auth::extractors::CurrentUser, error::ApiError, state::AppState};

use super::{
    dto::{MetricsPage, MetricsQuery},
    query::QuerySpec,
    repo,
};

pub fn metrics_routes() -> Router<AppState> {
    Router::new().route("/metrics", get(list_metrics))
}

/// GET /metrics. Requires a valid bearer token; the caller's role decides
/// whether cost figures appear in the rows.
#[instrument(skip(state))]
pub async fn list_metrics(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(params): Query<MetricsQuery>,
) -> Result<Json<MetricsPage>, ApiError> {
    let spec = QuerySpec::new(&params, claims.role);

    let total_items = repo::count(&state.db, &spec).await?;
    let data = repo::fetch_page(&state.db, &spec).await?;

    Ok(Json(MetricsPage {
        page: spec.page,
        page_size: spec.page_size,
        total_items,
        data,
    }))
}
