use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{favorite, locked_content, project};

fn index_statements() -> Vec<(&'static str, IndexCreateStatement)> {
    vec![
        // Plan-limit counts: deployed projects per user and chain.
        (
            "idx_project_user_chain",
            Index::create()
                .if_not_exists()
                .name("idx_project_user_chain")
                .table(project::Entity)
                .col(project::Column::UserId)
                .col(project::Column::ChainId)
                .to_owned(),
        ),
        // Explore page ordering.
        (
            "idx_project_market_cap",
            Index::create()
                .if_not_exists()
                .name("idx_project_market_cap")
                .table(project::Entity)
                .col(project::Column::MarketCap)
                .to_owned(),
        ),
        (
            "idx_favorite_user_created",
            Index::create()
                .if_not_exists()
                .name("idx_favorite_user_created")
                .table(favorite::Entity)
                .col(favorite::Column::UserId)
                .col(favorite::Column::CreatedAt)
                .to_owned(),
        ),
        (
            "idx_locked_content_project",
            Index::create()
                .if_not_exists()
                .name("idx_locked_content_project")
                .table(locked_content::Entity)
                .col(locked_content::Column::ProjectId)
                .to_owned(),
        ),
    ]
}

/// Ensure secondary indexes exist.
///
/// Schema sync only creates tables and unique constraints, so composite
/// lookup indexes are created here on startup. Failures are logged and
/// skipped; queries still work without them.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    for (name, stmt) in index_statements() {
        match db
            .execute_unprepared(&stmt.to_string(PostgresQueryBuilder))
            .await
        {
            Ok(_) => info!("Ensured index {name} exists"),
            Err(e) => warn!("Failed to create index {name}: {e}"),
        }
    }
    Ok(())
}
