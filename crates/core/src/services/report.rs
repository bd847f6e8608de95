//! Report service: submission, lifecycle, and search.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use civicreport_common::{AppError, AppResult};
use civicreport_db::{
    entities::{category, report},
    repositories::{CategoryRepository, ReportRepository},
};
use sea_orm::{ActiveEnum, Iterable, Set};
use serde::Serialize;

pub use civicreport_db::entities::report::ReportStatus;
pub use civicreport_db::repositories::{ReportFilter, SortKey, SortOrder};

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 4000;
const MAX_ADDRESS_LEN: usize = 500;

const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 100;

/// Who submitted a report.
///
/// Contact fields only exist on the anonymous arm; registered submitters are
/// reachable through their account.
#[derive(Debug, Clone)]
pub enum Submitter {
    Registered {
        user_id: String,
    },
    Anonymous {
        contact_email: Option<String>,
        contact_phone: Option<String>,
    },
}

/// Input for creating a report.
#[derive(Debug, Clone)]
pub struct CreateReportInput {
    pub title: String,
    pub description: String,
    pub address: String,
    pub category_id: i32,
    /// Already-stored image reference, if the caller uploaded one first.
    pub image: Option<String>,
    pub submitter: Submitter,
}

/// Input for a status change.
#[derive(Debug, Clone)]
pub struct UpdateStatusInput {
    pub status: ReportStatus,
    /// Non-empty notes overwrite the stored notes; empty or absent leaves
    /// them untouched.
    pub admin_notes: Option<String>,
}

/// A report decorated for presentation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub address: String,
    pub image: Option<String>,
    pub category_id: i32,
    pub category_name: Option<String>,
    pub category_icon: Option<String>,
    pub category_color: Option<String>,
    pub user_id: Option<String>,
    pub is_anonymous: bool,
    pub status: ReportStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub resolved_at: Option<DateTime<FixedOffset>>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub has_image: bool,
    /// Whole days since creation at the time the view was built.
    pub days_since_created: i64,
}

impl ReportView {
    pub(crate) fn decorate(
        model: report::Model,
        categories: &HashMap<i32, category::Model>,
        now: DateTime<Utc>,
    ) -> Self {
        let category = categories.get(&model.category_id);
        let days_since_created = now.signed_duration_since(model.created_at).num_days();
        Self {
            id: model.id,
            has_image: model.has_image(),
            is_anonymous: model.is_anonymous(),
            category_name: category.map(|c| c.name.clone()),
            category_icon: category.map(|c| c.icon.clone()),
            category_color: category.map(|c| c.color.clone()),
            title: model.title,
            description: model.description,
            address: model.address,
            image: model.image,
            category_id: model.category_id,
            user_id: model.user_id,
            status: model.status,
            admin_notes: model.admin_notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
            resolved_at: model.resolved_at,
            contact_email: model.contact_email,
            contact_phone: model.contact_phone,
            days_since_created,
        }
    }
}

/// Pagination metadata for a search result page.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Pagination {
    /// Compute page metadata. A page past the end simply yields no items;
    /// the metadata stays accurate.
    #[must_use]
    pub const fn compute(page: u64, page_size: u64, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(page_size);
        Self {
            page,
            page_size,
            total_count,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

/// Clamp a 1-indexed page number.
#[must_use]
pub fn normalize_page(page: i64) -> u64 {
    if page < 1 { 1 } else { page as u64 }
}

/// Normalize a page size: non-positive falls back to the default, oversized
/// is capped.
#[must_use]
pub fn normalize_page_size(page_size: i64) -> u64 {
    if page_size < 1 {
        DEFAULT_PAGE_SIZE
    } else {
        (page_size as u64).min(MAX_PAGE_SIZE)
    }
}

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedReports {
    pub items: Vec<ReportView>,
    pub pagination: Pagination,
}

/// A status option for UI pickers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOption {
    pub value: i32,
    pub name: &'static str,
    pub display_name: &'static str,
}

/// A sort option for UI pickers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOption {
    pub value: &'static str,
    pub name: &'static str,
}

/// Everything the search UI needs to build its filter controls.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub categories: Vec<category::Model>,
    pub status_options: Vec<StatusOption>,
    pub sort_options: Vec<SortOption>,
    pub sort_order_options: Vec<SortOption>,
}

/// Derive the resolution timestamp after a status change.
///
/// Entering the resolution bucket stamps `now` unless already stamped;
/// leaving it always clears. Moving between `Resolved` and `Closed` keeps
/// the original stamp.
fn derive_resolved_at(
    current: Option<DateTime<FixedOffset>>,
    new_status: ReportStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<FixedOffset>> {
    if new_status.in_resolution_bucket() {
        current.or_else(|| Some(now.into()))
    } else {
        None
    }
}

/// Report service for submission, lifecycle, and search.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    category_repo: CategoryRepository,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(report_repo: ReportRepository, category_repo: CategoryRepository) -> Self {
        Self {
            report_repo,
            category_repo,
        }
    }

    /// Create a new report with status `Submitted`.
    pub async fn create_report(&self, input: CreateReportInput) -> AppResult<report::Model> {
        let title = require_field(&input.title, "Title", MAX_TITLE_LEN)?;
        let description = require_field(&input.description, "Description", MAX_DESCRIPTION_LEN)?;
        let address = require_field(&input.address, "Address", MAX_ADDRESS_LEN)?;

        if !self.category_repo.exists(input.category_id).await? {
            return Err(AppError::BadRequest("Invalid category ID".to_string()));
        }

        let (user_id, contact_email, contact_phone) = match input.submitter {
            Submitter::Registered { user_id } => (Some(user_id), None, None),
            Submitter::Anonymous {
                contact_email,
                contact_phone,
            } => (None, contact_email, contact_phone),
        };

        let model = report::ActiveModel {
            title: Set(title),
            description: Set(description),
            address: Set(address),
            image: Set(input.image.filter(|path| !path.is_empty())),
            category_id: Set(input.category_id),
            user_id: Set(user_id),
            status: Set(ReportStatus::Submitted),
            admin_notes: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
            resolved_at: Set(None),
            contact_email: Set(contact_email),
            contact_phone: Set(contact_phone),
            version: Set(0),
            ..Default::default()
        };

        let created = self.report_repo.create(model).await?;
        tracing::info!(report_id = created.id, "Report created");
        Ok(created)
    }

    /// Get a report by id.
    pub async fn get_report(&self, id: i32) -> AppResult<report::Model> {
        self.report_repo.get(id).await
    }

    /// Get a report by id, decorated for presentation.
    pub async fn get_report_view(&self, id: i32) -> AppResult<ReportView> {
        let model = self.report_repo.get(id).await?;
        let categories = self.category_map().await?;
        Ok(ReportView::decorate(model, &categories, Utc::now()))
    }

    /// Reports submitted by a user, newest first, with category decoration.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<ReportView>> {
        let models = self.report_repo.list_for_user(user_id).await?;
        let categories = self.category_map().await?;
        let now = Utc::now();
        Ok(models
            .into_iter()
            .map(|m| ReportView::decorate(m, &categories, now))
            .collect())
    }

    /// Change a report's status.
    ///
    /// The resolution timestamp is derived from the new status; the write is
    /// versioned so two concurrent changes to the same report cannot
    /// interleave their derivations.
    pub async fn update_status(
        &self,
        report_id: i32,
        input: UpdateStatusInput,
    ) -> AppResult<report::Model> {
        let report = self.report_repo.get(report_id).await?;

        let now = Utc::now();
        let resolved_at = derive_resolved_at(report.resolved_at, input.status, now);
        let admin_notes = input
            .admin_notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map(ToString::to_string);

        let mut active = report::ActiveModel {
            status: Set(input.status),
            resolved_at: Set(resolved_at),
            updated_at: Set(Some(now.into())),
            version: Set(report.version + 1),
            ..Default::default()
        };
        if let Some(notes) = &admin_notes {
            active.admin_notes = Set(Some(notes.clone()));
        }

        let written = self
            .report_repo
            .update_versioned(report_id, report.version, active)
            .await?;
        if !written {
            return Err(AppError::Conflict(
                "Report was modified concurrently".to_string(),
            ));
        }

        tracing::info!(
            report_id,
            status = input.status.name(),
            "Report status updated"
        );

        let mut updated = report;
        updated.status = input.status;
        updated.resolved_at = resolved_at;
        updated.updated_at = Some(now.into());
        updated.version += 1;
        if let Some(notes) = admin_notes {
            updated.admin_notes = Some(notes);
        }
        Ok(updated)
    }

    /// Attach or replace the image reference on a report.
    pub async fn attach_image(&self, report_id: i32, path: String) -> AppResult<report::Model> {
        if path.trim().is_empty() {
            return Err(AppError::Validation("Image path is required".to_string()));
        }

        let report = self.report_repo.get(report_id).await?;
        let mut active: report::ActiveModel = report.into();
        active.image = Set(Some(path));
        active.updated_at = Set(Some(Utc::now().into()));
        self.report_repo.update(active).await
    }

    /// Clear the image reference on a report.
    pub async fn clear_image(&self, report_id: i32) -> AppResult<report::Model> {
        let report = self.report_repo.get(report_id).await?;
        if !report.has_image() {
            return Err(AppError::BadRequest("No image to delete".to_string()));
        }

        let mut active: report::ActiveModel = report.into();
        active.image = Set(None);
        active.updated_at = Set(Some(Utc::now().into()));
        self.report_repo.update(active).await
    }

    /// Delete a report (administrative).
    pub async fn delete_report(&self, id: i32) -> AppResult<()> {
        self.report_repo.delete(id).await?;
        tracing::info!(report_id = id, "Report deleted");
        Ok(())
    }

    /// Filtered, sorted, paginated search over all reports.
    ///
    /// Malformed pagination values are normalized, never rejected.
    pub async fn search(
        &self,
        filter: &ReportFilter,
        sort_key: SortKey,
        sort_order: SortOrder,
        page: i64,
        page_size: i64,
    ) -> AppResult<PagedReports> {
        let page = normalize_page(page);
        let page_size = normalize_page_size(page_size);
        let offset = (page - 1) * page_size;

        let (models, total) = self
            .report_repo
            .search(filter, sort_key, sort_order, offset, page_size)
            .await?;

        let categories = self.category_map().await?;
        let now = Utc::now();
        let items = models
            .into_iter()
            .map(|m| ReportView::decorate(m, &categories, now))
            .collect();

        Ok(PagedReports {
            items,
            pagination: Pagination::compute(page, page_size, total),
        })
    }

    /// Data for the search UI's filter controls.
    pub async fn filter_options(&self) -> AppResult<FilterOptions> {
        let categories = self.category_repo.all().await?;

        let status_options = ReportStatus::iter()
            .map(|status| StatusOption {
                value: status.to_value(),
                name: status.name(),
                display_name: status.display_name(),
            })
            .collect();

        let sort_options = vec![
            SortOption { value: SortKey::Created.name(), name: "Created Date" },
            SortOption { value: SortKey::Title.name(), name: "Title" },
            SortOption { value: SortKey::Status.name(), name: "Status" },
            SortOption { value: SortKey::Category.name(), name: "Category" },
            SortOption { value: SortKey::Address.name(), name: "Address" },
        ];

        let sort_order_options = vec![
            SortOption { value: SortOrder::Desc.name(), name: "Descending" },
            SortOption { value: SortOrder::Asc.name(), name: "Ascending" },
        ];

        Ok(FilterOptions {
            categories,
            status_options,
            sort_options,
            sort_order_options,
        })
    }

    pub(crate) async fn category_map(&self) -> AppResult<HashMap<i32, category::Model>> {
        let categories = self.category_repo.all().await?;
        Ok(categories.into_iter().map(|c| (c.id, c)).collect())
    }
}

fn require_field(value: &str, label: &str, max_len: usize) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{label} is required")));
    }
    if trimmed.len() > max_len {
        return Err(AppError::Validation(format!("{label} too long")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_report(id: i32, status: ReportStatus) -> report::Model {
        report::Model {
            id,
            title: "Pothole on Main St".to_string(),
            description: "Deep pothole near the crosswalk".to_string(),
            address: "1 Main St".to_string(),
            image: None,
            category_id: 1,
            user_id: None,
            status,
            admin_notes: None,
            created_at: Utc::now().into(),
            updated_at: None,
            resolved_at: None,
            contact_email: None,
            contact_phone: None,
            version: 0,
        }
    }

    fn service_with(db: MockDatabase) -> ReportService {
        let db = Arc::new(db.into_connection());
        ReportService::new(
            ReportRepository::new(db.clone()),
            CategoryRepository::new(db),
        )
    }

    // === resolution timestamp derivation ===

    #[test]
    fn derivation_follows_the_transition_sequence() {
        let now = Utc::now();

        // Submitted -> Resolved: stamped
        let after_resolve = derive_resolved_at(None, ReportStatus::Resolved, now);
        assert!(after_resolve.is_some());

        // Resolved -> InProgress: cleared
        let after_reopen = derive_resolved_at(after_resolve, ReportStatus::InProgress, now);
        assert!(after_reopen.is_none());

        // InProgress -> Closed: stamped again
        let after_close = derive_resolved_at(after_reopen, ReportStatus::Closed, now);
        assert!(after_close.is_some());
    }

    #[test]
    fn derivation_does_not_restamp_within_the_bucket() {
        let first: DateTime<FixedOffset> =
            "2025-06-01T12:00:00+00:00".parse().unwrap();
        let later = Utc::now();

        let kept = derive_resolved_at(Some(first), ReportStatus::Closed, later);
        assert_eq!(kept, Some(first));
    }

    #[test]
    fn derivation_clears_for_every_pending_status() {
        let stamp: DateTime<FixedOffset> = "2025-06-01T12:00:00+00:00".parse().unwrap();
        let now = Utc::now();
        for status in [
            ReportStatus::Submitted,
            ReportStatus::InReview,
            ReportStatus::InProgress,
        ] {
            assert_eq!(derive_resolved_at(Some(stamp), status, now), None);
        }
    }

    // === pagination ===

    #[test]
    fn pagination_past_the_end_keeps_accurate_metadata() {
        let pagination = Pagination::compute(3, 20, 25);
        assert_eq!(pagination.total_pages, 2);
        assert!(!pagination.has_next);
        assert!(pagination.has_previous);
    }

    #[test]
    fn pagination_of_empty_set() {
        let pagination = Pagination::compute(1, 20, 0);
        assert_eq!(pagination.total_pages, 0);
        assert!(!pagination.has_next);
        assert!(!pagination.has_previous);
    }

    #[test]
    fn page_normalization_clamps_to_one() {
        assert_eq!(normalize_page(0), 1);
        assert_eq!(normalize_page(-5), 1);
        assert_eq!(normalize_page(3), 3);
    }

    #[test]
    fn page_size_normalization_defaults_and_caps() {
        assert_eq!(normalize_page_size(0), 20);
        assert_eq!(normalize_page_size(-1), 20);
        assert_eq!(normalize_page_size(500), 100);
        assert_eq!(normalize_page_size(50), 50);
    }

    // === status changes ===

    #[tokio::test]
    async fn update_status_stamps_resolved_at() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_report(1, ReportStatus::InProgress)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);

        let service = service_with(db);
        let updated = service
            .update_status(
                1,
                UpdateStatusInput {
                    status: ReportStatus::Resolved,
                    admin_notes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, ReportStatus::Resolved);
        assert!(updated.resolved_at.is_some());
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.version, 1);
    }

    #[tokio::test]
    async fn update_status_clears_resolved_at_on_reopen() {
        let mut report = test_report(1, ReportStatus::Resolved);
        report.resolved_at = Some(Utc::now().into());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[report]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);

        let service = service_with(db);
        let updated = service
            .update_status(
                1,
                UpdateStatusInput {
                    status: ReportStatus::InReview,
                    admin_notes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, ReportStatus::InReview);
        assert!(updated.resolved_at.is_none());
    }

    #[tokio::test]
    async fn update_status_missing_report_writes_nothing() {
        // No exec results appended: any write would fail the mock.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<report::Model>::new()]);

        let service = service_with(db);
        let result = service
            .update_status(
                42,
                UpdateStatusInput {
                    status: ReportStatus::Resolved,
                    admin_notes: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::ReportNotFound(42))));
    }

    #[tokio::test]
    async fn update_status_blank_notes_leave_existing_notes() {
        let mut report = test_report(1, ReportStatus::Submitted);
        report.admin_notes = Some("Crew dispatched".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[report]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);

        let service = service_with(db);
        let updated = service
            .update_status(
                1,
                UpdateStatusInput {
                    status: ReportStatus::InProgress,
                    admin_notes: Some("   ".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.admin_notes.as_deref(), Some("Crew dispatched"));
    }

    #[tokio::test]
    async fn update_status_lost_race_is_a_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_report(1, ReportStatus::Submitted)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }]);

        let service = service_with(db);
        let result = service
            .update_status(
                1,
                UpdateStatusInput {
                    status: ReportStatus::Resolved,
                    admin_notes: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    // === creation ===

    #[tokio::test]
    async fn create_report_rejects_empty_title() {
        let db = MockDatabase::new(DatabaseBackend::Postgres);
        let service = service_with(db);

        let result = service
            .create_report(CreateReportInput {
                title: "   ".to_string(),
                description: "desc".to_string(),
                address: "addr".to_string(),
                category_id: 1,
                image: None,
                submitter: Submitter::Anonymous {
                    contact_email: None,
                    contact_phone: None,
                },
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_report_rejects_unknown_category() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
            [maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(0))
            }],
        ]);
        let service = service_with(db);

        let result = service
            .create_report(CreateReportInput {
                title: "Broken light".to_string(),
                description: "The light is out".to_string(),
                address: "2 Elm St".to_string(),
                category_id: 99,
                image: None,
                submitter: Submitter::Anonymous {
                    contact_email: None,
                    contact_phone: None,
                },
            })
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    // === views ===

    #[test]
    fn decorate_computes_days_and_flags() {
        let mut model = test_report(7, ReportStatus::Submitted);
        model.created_at = (Utc::now() - chrono::Duration::days(3)
            - chrono::Duration::hours(5))
        .into();
        model.image = Some("/uploads/7_abc.jpg".to_string());

        let categories: HashMap<i32, category::Model> = [(
            1,
            category::Model {
                id: 1,
                name: "Pothole".to_string(),
                icon: "road".to_string(),
                color: "#FF6B6B".to_string(),
            },
        )]
        .into_iter()
        .collect();

        let view = ReportView::decorate(model, &categories, Utc::now());

        assert_eq!(view.days_since_created, 3);
        assert!(view.has_image);
        assert!(view.is_anonymous);
        assert_eq!(view.category_name.as_deref(), Some("Pothole"));
    }
}
