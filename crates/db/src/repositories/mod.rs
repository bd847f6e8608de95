//! Database repositories.

pub mod category;
pub mod report;

pub use category::CategoryRepository;
pub use report::{
    CategoryStatusRow, CreatedStatusRow, ReportFilter, ReportRepository, ResolutionRow, SortKey,
    SortOrder,
};
