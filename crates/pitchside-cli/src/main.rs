mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "pitchside-cli")]
#[command(about = "Pitchside match-article pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate articles for completed fixtures, then backfill images
    Process {
        /// List eligible fixtures without generating anything
        #[arg(long)]
        dry_run: bool,
        /// Skip the image backfill after processing
        #[arg(long)]
        skip_images: bool,
    },
    /// Fill in missing scores from stored article text
    Scores {
        /// Restrict to one fixture
        #[arg(long)]
        fixture: Option<Uuid>,
    },
    /// Generate header images for articles that have none
    Images,
    /// Check database connectivity and configured integrations
    Check,
    /// Print the effective configuration with secrets redacted
    Config,
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("pitchside-cli: no command given (try --help)");
        return Ok(());
    };

    let config = pitchside_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Config => commands::print_config(&config),
        Commands::Process {
            dry_run,
            skip_images,
        } => commands::run_process(connect(&config).await?, &config, dry_run, skip_images).await?,
        Commands::Scores { fixture } => {
            commands::run_scores(connect(&config).await?, &config, fixture).await?;
        }
        Commands::Images => commands::run_images(connect(&config).await?, &config).await?,
        Commands::Check => commands::run_check(&connect(&config).await?, &config).await?,
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            pitchside_db::health_check(&connect(&config).await?).await?;
            println!("database ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = pitchside_db::run_migrations(&connect(&config).await?).await?;
            println!("migrations up to date ({applied} applied)");
        }
    }

    Ok(())
}

async fn connect(config: &pitchside_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = pitchside_db::PoolConfig::from_app_config(config);
    Ok(pitchside_db::connect_pool(&config.database_url, pool_config).await?)
}
