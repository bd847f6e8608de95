//! Seed the fixed category set.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CATEGORIES: [(i32, &str, &str, &str); 8] = [
    (1, "Pothole", "road", "#FF6B6B"),
    (2, "Street Light", "lightbulb", "#4ECDC4"),
    (3, "Graffiti", "spray-can", "#45B7D1"),
    (4, "Trash", "trash", "#96CEB4"),
    (5, "Traffic Sign", "traffic-cone", "#F39C12"),
    (6, "Water/Sewer", "droplet", "#3498DB"),
    (7, "Parks/Recreation", "tree", "#27AE60"),
    (8, "Other", "alert-circle", "#FECA57"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert()
            .into_table(Category::Table)
            .columns([Category::Id, Category::Name, Category::Icon, Category::Color])
            .to_owned();

        for (id, name, icon, color) in CATEGORIES {
            insert.values_panic([id.into(), name.into(), icon.into(), color.into()]);
        }

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let ids = CATEGORIES.map(|(id, _, _, _)| id);
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Category::Table)
                    .cond_where(Expr::col(Category::Id).is_in(ids))
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Category {
    Table,
    Id,
    Name,
    Icon,
    Color,
}
