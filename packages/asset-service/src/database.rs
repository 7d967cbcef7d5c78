use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::entity::{asset, submission};

pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.to_owned());

    // Set connection pool options
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("asset_service::entity::*")
        .sync(&db)
        .await?;
    ensure_indexes(&db).await;

    Ok(db)
}

/// Index every parent foreign key; listing and cascades filter on them.
pub async fn ensure_indexes(db: &DatabaseConnection) {
    let indexes = [
        ("idx_asset_lab", Index::create()
            .if_not_exists()
            .name("idx_asset_lab")
            .table(asset::Entity)
            .col(asset::Column::LabId)
            .to_owned()),
        ("idx_asset_article", Index::create()
            .if_not_exists()
            .name("idx_asset_article")
            .table(asset::Entity)
            .col(asset::Column::ArticleId)
            .to_owned()),
        ("idx_asset_submission", Index::create()
            .if_not_exists()
            .name("idx_asset_submission")
            .table(asset::Entity)
            .col(asset::Column::SubmissionId)
            .to_owned()),
        ("idx_submission_lab", Index::create()
            .if_not_exists()
            .name("idx_submission_lab")
            .table(submission::Entity)
            .col(submission::Column::LabId)
            .to_owned()),
    ];

    let backend = db.get_database_backend();
    for (name, index) in indexes {
        match db.execute_raw(backend.build(&index)).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => warn!("Failed to create index {}: {}", name, e),
        }
    }
}
