//! Citizen report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report lifecycle status.
///
/// Stored as its integer value so that ORDER BY on the column follows the
/// lifecycle order rather than the alphabetical order of the names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "camelCase")]
#[derive(Default)]
pub enum ReportStatus {
    #[sea_orm(num_value = 1)]
    #[default]
    Submitted,
    #[sea_orm(num_value = 2)]
    InReview,
    #[sea_orm(num_value = 3)]
    InProgress,
    #[sea_orm(num_value = 4)]
    Resolved,
    #[sea_orm(num_value = 5)]
    Closed,
}

impl ReportStatus {
    /// Whether this status counts as "done" for dashboard aggregation.
    #[must_use]
    pub const fn in_resolution_bucket(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }

    /// Machine-readable name, as used on the wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::InReview => "inReview",
            Self::InProgress => "inProgress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Human-readable name for UI pickers.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::InReview => "In Review",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
        }
    }
}

/// Report model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Street address the report refers to.
    pub address: String,
    /// Stored image reference; `None` and empty string both mean "no image".
    pub image: Option<String>,
    /// Category of the reported issue.
    pub category_id: i32,
    /// Submitting user; `None` for anonymous submissions.
    pub user_id: Option<String>,
    pub status: ReportStatus,
    /// Staff-only free text.
    pub admin_notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    /// Set on every mutation.
    pub updated_at: Option<DateTimeWithTimeZone>,
    /// Derived from status; see the lifecycle service.
    pub resolved_at: Option<DateTimeWithTimeZone>,
    /// Contact fields, used only for anonymous submissions.
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    /// Row version for optimistic concurrency on status changes.
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether an image reference is present and non-empty.
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|path| !path.is_empty())
    }

    /// Whether the report was submitted anonymously.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_bucket_covers_resolved_and_closed() {
        assert!(ReportStatus::Resolved.in_resolution_bucket());
        assert!(ReportStatus::Closed.in_resolution_bucket());
        assert!(!ReportStatus::Submitted.in_resolution_bucket());
        assert!(!ReportStatus::InReview.in_resolution_bucket());
        assert!(!ReportStatus::InProgress.in_resolution_bucket());
    }

    #[test]
    fn empty_image_reference_counts_as_absent() {
        let mut report = Model {
            id: 1,
            title: "Pothole on Main St".to_string(),
            description: "Deep pothole".to_string(),
            address: "1 Main St".to_string(),
            image: Some(String::new()),
            category_id: 1,
            user_id: None,
            status: ReportStatus::Submitted,
            admin_notes: None,
            created_at: chrono::Utc::now().into(),
            updated_at: None,
            resolved_at: None,
            contact_email: None,
            contact_phone: None,
            version: 0,
        };
        assert!(!report.has_image());

        report.image = Some("/uploads/1_abc.jpg".to_string());
        assert!(report.has_image());

        report.image = None;
        assert!(!report.has_image());
    }
}
