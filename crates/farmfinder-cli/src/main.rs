mod db;
mod geocode;
mod search;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "farmfinder-cli")]
#[command(about = "farmfinder command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Resolve one or more postal codes to coordinates
    Geocode {
        /// US ZIP or ZIP+4 codes
        #[arg(required = true)]
        postal_codes: Vec<String>,
    },
    /// Run a proximity search and print grouped results
    Search(search::SearchArgs),
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert locations from the YAML seed file
    Seed {
        /// Override `FARMFINDER_LOCATIONS_PATH`
        #[arg(long)]
        path: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("farmfinder-cli: run with --help to list commands");
        return Ok(());
    };

    let config = farmfinder_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Db { command } => {
            let pool = db::connect(&config).await?;
            match command {
                DbCommands::Ping => db::run_db_ping(&pool).await?,
                DbCommands::Migrate => db::run_db_migrate(&pool).await?,
                DbCommands::Seed { path } => {
                    let path = path.unwrap_or_else(|| config.locations_path.clone());
                    db::run_db_seed(&pool, &path).await?;
                }
            }
        }
        Commands::Geocode { postal_codes } => {
            geocode::run_geocode(&config, &postal_codes).await?;
        }
        Commands::Search(args) => {
            let pool = db::connect(&config).await?;
            search::run_search(&config, &pool, args).await?;
        }
    }

    Ok(())
}
