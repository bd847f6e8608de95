//! Dashboard endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use civicreport_common::AppResult;
use civicreport_core::{CategoryStat, MonthlyTrend, Overview, PerformanceMetrics, ReportView};
use serde::Deserialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Create dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/category-stats", get(category_stats))
        .route("/monthly-trends", get(monthly_trends))
        .route("/recent-activity", get(recent_activity))
        .route("/performance-metrics", get(performance_metrics))
}

async fn overview(State(state): State<AppState>) -> AppResult<ApiResponse<Overview>> {
    let data = state.dashboard_service.overview().await?;
    Ok(ApiResponse::ok(data))
}

async fn category_stats(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CategoryStat>>> {
    let data = state.dashboard_service.category_breakdown().await?;
    Ok(ApiResponse::ok(data))
}

/// Monthly trends query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsQuery {
    /// Number of trailing months; malformed values fall back to the default.
    #[serde(default)]
    pub months: Option<String>,
}

async fn monthly_trends(
    State(state): State<AppState>,
    Query(query): Query<TrendsQuery>,
) -> AppResult<ApiResponse<Vec<MonthlyTrend>>> {
    let months = query
        .months
        .as_deref()
        .and_then(|value| value.parse().ok())
        .unwrap_or(12);
    let data = state.dashboard_service.monthly_trends(months).await?;
    Ok(ApiResponse::ok(data))
}

/// Recent activity query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    #[serde(default)]
    pub limit: Option<String>,
}

async fn recent_activity(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> AppResult<ApiResponse<Vec<ReportView>>> {
    let limit = query
        .limit
        .as_deref()
        .and_then(|value| value.parse().ok())
        .unwrap_or(20);
    let data = state.dashboard_service.recent_activity(limit).await?;
    Ok(ApiResponse::ok(data))
}

async fn performance_metrics(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<PerformanceMetrics>> {
    let data = state.dashboard_service.performance_metrics().await?;
    Ok(ApiResponse::ok(data))
}
