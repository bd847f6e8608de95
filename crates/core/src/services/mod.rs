//! Business logic services.

pub mod category;
pub mod dashboard;
pub mod report;

pub use category::CategoryService;
pub use dashboard::{
    CategoryStat, DashboardService, MonthlyTrend, Overview, PerformanceMetrics, StatusBreakdown,
};
pub use report::{
    CreateReportInput, FilterOptions, PagedReports, Pagination, ReportFilter, ReportService,
    ReportStatus, ReportView, SortKey, SortOption, SortOrder, StatusOption, Submitter,
    UpdateStatusInput,
};
