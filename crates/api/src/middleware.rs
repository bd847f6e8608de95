//! API middleware and shared state.

#![allow(missing_docs)]

use civicreport_common::Config;
use civicreport_core::{CategoryService, DashboardService, ReportService};
use std::sync::Arc;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub report_service: ReportService,
    pub dashboard_service: DashboardService,
    pub category_service: CategoryService,
    pub config: Arc<Config>,
}
