//! Category service.
//!
//! Categories are seeded reference data; this service only reads them.

use civicreport_common::AppResult;
use civicreport_db::{entities::category, repositories::CategoryRepository};

/// Category service for reading the fixed category set.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository) -> Self {
        Self { category_repo }
    }

    /// All categories, ordered by id.
    pub async fn list(&self) -> AppResult<Vec<category::Model>> {
        self.category_repo.all().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn list_returns_seeded_categories() {
        let categories = vec![
            category::Model {
                id: 1,
                name: "Pothole".to_string(),
                icon: "road".to_string(),
                color: "#FF6B6B".to_string(),
            },
            category::Model {
                id: 2,
                name: "Street Light".to_string(),
                icon: "lightbulb".to_string(),
                color: "#4ECDC4".to_string(),
            },
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([categories])
                .into_connection(),
        );

        let service = CategoryService::new(CategoryRepository::new(db));
        let result = service.list().await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "Pothole");
    }
}
