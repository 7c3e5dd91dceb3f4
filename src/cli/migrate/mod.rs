//! Migrate command - applies the PostgreSQL schema and exits

use tracing::info;

use crate::infrastructure::storage::{
    connect, run_account_migrations, PostgresConfig, PostgresMigrator,
};

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap();

    let pg_config = PostgresConfig::new(&config.storage.database_url)
        .with_max_connections(1)
        .with_connect_timeout(config.storage.connect_timeout_secs);

    let pool = connect(&pg_config).await?;
    let applied = run_account_migrations(&pool).await?;

    let version = PostgresMigrator::new(pool.clone()).current_version().await?;

    info!(applied, version = ?version, "Migrations complete");

    pool.close().await;

    Ok(())
}
