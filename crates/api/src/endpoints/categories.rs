//! Category endpoints.

use axum::{Router, extract::State, routing::get};
use civicreport_common::AppResult;
use civicreport_db::entities::category;

use crate::{middleware::AppState, response::ApiResponse};

/// Create category router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<category::Model>>> {
    let categories = state.category_service.list().await?;
    Ok(ApiResponse::ok(categories))
}
