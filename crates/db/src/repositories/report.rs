//! Report repository for database operations.

use std::sync::Arc;

use crate::entities::{
    Report,
    category,
    report::{self, ReportStatus},
};
use civicreport_common::{AppError, AppResult};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    JoinType, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

/// Filters applied to a report search. All optional, ANDed when present.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    /// Case-insensitive substring match against title, description or address.
    pub keyword: Option<String>,
    pub category_id: Option<i32>,
    pub status: Option<ReportStatus>,
    /// Inclusive lower bound on `created_at`.
    pub from_date: Option<chrono::DateTime<chrono::Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub to_date: Option<chrono::DateTime<chrono::Utc>>,
    /// Case-insensitive substring match against the address alone.
    pub address: Option<String>,
    /// `true` requires a present, non-empty image reference; `false` the opposite.
    pub has_image: Option<bool>,
    /// `true` matches reports without a submitting user.
    pub is_anonymous: Option<bool>,
}

impl ReportFilter {
    /// Build the WHERE condition for this filter.
    #[must_use]
    pub fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.is_empty()) {
            let pattern = like_pattern(keyword);
            condition = condition.add(
                Condition::any()
                    .add(Expr::col(report::Column::Title).ilike(pattern.clone()))
                    .add(Expr::col(report::Column::Description).ilike(pattern.clone()))
                    .add(Expr::col(report::Column::Address).ilike(pattern)),
            );
        }

        if let Some(category_id) = self.category_id {
            condition = condition.add(report::Column::CategoryId.eq(category_id));
        }

        if let Some(status) = self.status {
            condition = condition.add(report::Column::Status.eq(status));
        }

        if let Some(from) = self.from_date {
            condition = condition.add(report::Column::CreatedAt.gte(from));
        }

        if let Some(to) = self.to_date {
            condition = condition.add(report::Column::CreatedAt.lte(to));
        }

        if let Some(address) = self.address.as_deref().filter(|a| !a.is_empty()) {
            condition = condition.add(Expr::col(report::Column::Address).ilike(like_pattern(address)));
        }

        if let Some(has_image) = self.has_image {
            condition = condition.add(if has_image {
                Condition::all()
                    .add(report::Column::Image.is_not_null())
                    .add(report::Column::Image.ne(""))
            } else {
                Condition::any()
                    .add(report::Column::Image.is_null())
                    .add(report::Column::Image.eq(""))
            });
        }

        if let Some(is_anonymous) = self.is_anonymous {
            condition = condition.add(if is_anonymous {
                report::Column::UserId.is_null()
            } else {
                report::Column::UserId.is_not_null()
            });
        }

        condition
    }
}

/// Escape LIKE metacharacters and wrap in wildcards.
fn like_pattern(needle: &str) -> String {
    format!("%{}%", needle.replace('%', "\\%").replace('_', "\\_"))
}

/// Sort keys accepted by the search operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Created,
    Title,
    Status,
    Category,
    Address,
}

impl SortKey {
    /// Parse a wire-format sort key; unrecognized values fall back to `Created`.
    #[must_use]
    pub fn parse(key: &str) -> Self {
        match key.to_ascii_lowercase().as_str() {
            "title" => Self::Title,
            "status" => Self::Status,
            "category" => Self::Category,
            "address" => Self::Address,
            _ => Self::Created,
        }
    }

    /// Wire-format name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Title => "title",
            Self::Status => "status",
            Self::Category => "category",
            Self::Address => "address",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse a wire-format direction; unrecognized values fall back to `Desc`.
    #[must_use]
    pub fn parse(order: &str) -> Self {
        match order.to_ascii_lowercase().as_str() {
            "asc" => Self::Asc,
            _ => Self::Desc,
        }
    }

    /// Wire-format name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    const fn order(self) -> Order {
        match self {
            Self::Asc => Order::Asc,
            Self::Desc => Order::Desc,
        }
    }
}

/// Row for resolution-time statistics.
#[derive(Debug, Clone, FromQueryResult)]
pub struct ResolutionRow {
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub resolved_at: chrono::DateTime<chrono::FixedOffset>,
}

/// Row for monthly trend aggregation.
#[derive(Debug, Clone, FromQueryResult)]
pub struct CreatedStatusRow {
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub status: ReportStatus,
}

/// Row for per-category aggregation.
#[derive(Debug, Clone, FromQueryResult)]
pub struct CategoryStatusRow {
    pub category_id: i32,
    pub status: ReportStatus,
}

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a new report.
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a report by id.
    pub async fn get(&self, id: i32) -> AppResult<report::Model> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or(AppError::ReportNotFound(id))
    }

    /// Update a report.
    pub async fn update(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a report only if its row version is still `expected_version`.
    ///
    /// Returns whether a row was written; `false` means a concurrent writer
    /// got there first.
    pub async fn update_versioned(
        &self,
        id: i32,
        expected_version: i32,
        model: report::ActiveModel,
    ) -> AppResult<bool> {
        let result = Report::update_many()
            .set(model)
            .filter(report::Column::Id.eq(id))
            .filter(report::Column::Version.eq(expected_version))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Delete a report.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = Report::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::ReportNotFound(id));
        }
        Ok(())
    }

    /// Reports submitted by a user, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<report::Model>> {
        Report::find()
            .filter(report::Column::UserId.eq(user_id))
            .order_by_desc(report::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Latest reports, newest first.
    pub async fn recent(&self, limit: u64) -> AppResult<Vec<report::Model>> {
        Report::find()
            .order_by_desc(report::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Filtered, sorted page of reports plus the total match count.
    pub async fn search(
        &self,
        filter: &ReportFilter,
        sort_key: SortKey,
        sort_order: SortOrder,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<report::Model>, u64)> {
        let condition = filter.condition();

        let total = Report::find()
            .filter(condition.clone())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let order = sort_order.order();
        let mut query = Report::find().filter(condition);

        query = match sort_key {
            SortKey::Created => query.order_by(report::Column::CreatedAt, order.clone()),
            SortKey::Title => query.order_by(report::Column::Title, order.clone()),
            SortKey::Status => query.order_by(report::Column::Status, order.clone()),
            SortKey::Address => query.order_by(report::Column::Address, order.clone()),
            SortKey::Category => query
                .join(JoinType::LeftJoin, report::Relation::Category.def())
                .order_by(category::Column::Name, order.clone()),
        };

        // Stable tie-break so paging never shuffles equal keys.
        let items = query
            .order_by(report::Column::Id, order)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((items, total))
    }

    /// Count all reports.
    pub async fn count_all(&self) -> AppResult<u64> {
        Report::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reports with the given status.
    pub async fn count_with_status(&self, status: ReportStatus) -> AppResult<u64> {
        Report::find()
            .filter(report::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reports created at or after `since`.
    pub async fn count_created_since(
        &self,
        since: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<u64> {
        Report::find()
            .filter(report::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reports created before `cutoff` that are still open.
    pub async fn count_overdue(&self, cutoff: chrono::DateTime<chrono::Utc>) -> AppResult<u64> {
        Report::find()
            .filter(report::Column::CreatedAt.lt(cutoff))
            .filter(
                report::Column::Status
                    .is_not_in([ReportStatus::Resolved, ReportStatus::Closed]),
            )
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Creation/resolution timestamp pairs for every resolved report.
    pub async fn resolution_rows(&self) -> AppResult<Vec<ResolutionRow>> {
        Report::find()
            .select_only()
            .column(report::Column::CreatedAt)
            .column(report::Column::ResolvedAt)
            .filter(report::Column::ResolvedAt.is_not_null())
            .into_model::<ResolutionRow>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Creation timestamp and status for reports created at or after `since`.
    pub async fn created_status_rows_since(
        &self,
        since: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<Vec<CreatedStatusRow>> {
        Report::find()
            .select_only()
            .column(report::Column::CreatedAt)
            .column(report::Column::Status)
            .filter(report::Column::CreatedAt.gte(since))
            .into_model::<CreatedStatusRow>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Category and status for every report.
    pub async fn category_status_rows(&self) -> AppResult<Vec<CategoryStatusRow>> {
        Report::find()
            .select_only()
            .column(report::Column::CategoryId)
            .column(report::Column::Status)
            .into_model::<CategoryStatusRow>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_report(id: i32, title: &str) -> report::Model {
        report::Model {
            id,
            title: title.to_string(),
            description: "Test description".to_string(),
            address: "1 Main St".to_string(),
            image: None,
            category_id: 1,
            user_id: None,
            status: ReportStatus::Submitted,
            admin_notes: None,
            created_at: Utc::now().into(),
            updated_at: None,
            resolved_at: None,
            contact_email: None,
            contact_phone: None,
            version: 0,
        }
    }

    #[test]
    fn sort_key_parse_falls_back_to_created() {
        assert_eq!(SortKey::parse("title"), SortKey::Title);
        assert_eq!(SortKey::parse("CATEGORY"), SortKey::Category);
        assert_eq!(SortKey::parse("bogus"), SortKey::Created);
        assert_eq!(SortKey::parse(""), SortKey::Created);
    }

    #[test]
    fn sort_order_parse_falls_back_to_desc() {
        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("descending"), SortOrder::Desc);
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[tokio::test]
    async fn test_get_returns_not_found_for_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<report::Model>::new()])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let result = repo.get(99).await;

        assert!(matches!(result, Err(AppError::ReportNotFound(99))));
    }

    #[tokio::test]
    async fn test_get_returns_report() {
        let report = create_test_report(1, "Pothole");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report.clone()]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let result = repo.get(1).await.unwrap();

        assert_eq!(result.id, 1);
        assert_eq!(result.title, "Pothole");
    }

    #[tokio::test]
    async fn test_count_all() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7))
                }]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let count = repo.count_all().await.unwrap();

        assert_eq!(count, 7);
    }

    #[tokio::test]
    async fn test_search_returns_items_and_total() {
        let report1 = create_test_report(1, "Pothole");
        let report2 = create_test_report(2, "Street light out");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .append_query_results([[report1, report2]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let filter = ReportFilter {
            keyword: Some("pothole".to_string()),
            ..ReportFilter::default()
        };
        let (items, total) = repo
            .search(&filter, SortKey::Created, SortOrder::Desc, 0, 20)
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_update_versioned_reports_lost_race() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let model = report::ActiveModel {
            status: sea_orm::Set(ReportStatus::Resolved),
            ..Default::default()
        };
        let written = repo.update_versioned(1, 3, model).await.unwrap();

        assert!(!written);
    }

    #[tokio::test]
    async fn test_delete_missing_report_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let result = repo.delete(5).await;

        assert!(matches!(result, Err(AppError::ReportNotFound(5))));
    }
}
