//! API endpoints.

pub mod categories;
pub mod dashboard;
pub mod reports;

use axum::Router;

use crate::middleware::AppState;

/// Assemble the full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/reports", reports::router())
        .nest("/api/dashboard", dashboard::router())
        .nest("/api/categories", categories::router())
}
