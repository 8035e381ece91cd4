use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_forum_tables::Courses;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Starter course catalogue.
const COURSES: [(&str, &str); 3] = [
    ("Spring Boot", "Programação"),
    ("HTML 5", "Front-end"),
    ("Rust", "Programação"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert()
            .into_table(Courses::Table)
            .columns([Courses::Name, Courses::Category])
            .to_owned();

        for (name, category) in COURSES {
            insert
                .values([name.into(), category.into()])
                .map_err(|e| DbErr::Migration(e.to_string()))?;
        }

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Courses::Table)
            .and_where(Expr::col(Courses::Name).is_in(COURSES.map(|(name, _)| name)))
            .to_owned();

        manager.exec_stmt(delete).await
    }
}
