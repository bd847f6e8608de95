//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250915_000001_create_category_table;
mod m20250915_000002_create_report_table;
mod m20250915_000003_seed_categories;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250915_000001_create_category_table::Migration),
            Box::new(m20250915_000002_create_report_table::Migration),
            Box::new(m20250915_000003_seed_categories::Migration),
        ]
    }
}
