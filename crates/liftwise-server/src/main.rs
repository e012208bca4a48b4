mod config;
mod html;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::warn;

use liftwise_core::llm::OpenAiClient;
use liftwise_db::pool;

use config::LiftwiseConfig;
use serve_cmd::AppState;

#[derive(Parser)]
#[command(name = "liftwise", about = "AI-generated weightlifting programs with day tracking")]
struct Cli {
    /// Database URL (overrides LIFTWISE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a liftwise config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/liftwise")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database and apply migrations
    DbInit,
    /// Start the web app
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

/// Execute the `liftwise init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let secret = config::generate_session_secret();

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        session: config::SessionSection {
            secret: secret.clone(),
        },
        openai: config::OpenAiSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  session.secret = {}...{}", &secret[..8], &secret[56..]);
    println!();
    println!("Set OPENAI_API_KEY (or add [openai] api_key to the config file),");
    println!("then run `liftwise db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `liftwise db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = LiftwiseConfig::resolve(cli_db_url)?;

    println!("Initializing liftwise database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("liftwise db-init complete.");
    Ok(())
}

/// Execute the `liftwise serve` command.
async fn cmd_serve(cli_db_url: Option<&str>, bind: &str, port: u16) -> anyhow::Result<()> {
    let resolved = LiftwiseConfig::resolve(cli_db_url)?;
    if resolved.openai.api_key.is_none() {
        warn!("no OpenAI API key configured; program generation and uploads will fail");
    }

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let client = Arc::new(OpenAiClient::new(resolved.openai)?);
    let state = AppState::new(
        db_pool.clone(),
        client.clone(),
        client,
        resolved.session_key,
    );

    let result = serve_cmd::run_serve(state, bind, port).await;
    db_pool.close().await;
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { db_url, force } => cmd_init(&db_url, force),
        Commands::DbInit => cmd_db_init(cli.database_url.as_deref()).await,
        Commands::Serve { bind, port } => {
            cmd_serve(cli.database_url.as_deref(), &bind, port).await
        }
    };

    if let Err(e) = result {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}
