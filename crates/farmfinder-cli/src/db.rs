//! `db` subcommand handlers.

use std::path::Path;

use farmfinder_core::AppConfig;
use sqlx::PgPool;

pub(crate) async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool_config = farmfinder_db::PoolConfig::from_app_config(config);
    let pool = farmfinder_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

/// # Errors
///
/// Returns an error if the database cannot be reached.
pub(crate) async fn run_db_ping(pool: &PgPool) -> anyhow::Result<()> {
    let count = farmfinder_db::health_check(pool).await?;
    println!("database ok ({count} locations)");
    Ok(())
}

/// # Errors
///
/// Returns an error if any migration fails.
pub(crate) async fn run_db_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = farmfinder_db::run_migrations(pool).await?;
    if applied == 0 {
        println!("migrations up to date");
    } else {
        println!("applied {applied} migration(s)");
    }
    Ok(())
}

/// Load the YAML seed file and upsert every location in one transaction.
///
/// # Errors
///
/// Returns an error if the file fails validation or the upsert fails.
pub(crate) async fn run_db_seed(pool: &PgPool, path: &Path) -> anyhow::Result<()> {
    let file = farmfinder_core::load_locations(path)?;
    tracing::info!(path = %path.display(), locations = file.locations.len(), "seeding locations");

    let count = farmfinder_db::seed_locations(pool, &file.locations).await?;
    println!("seeded {count} location(s) from {}", path.display());
    Ok(())
}
