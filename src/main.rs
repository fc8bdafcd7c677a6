use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsreel::app::AppContext;
use newsreel::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::new(cli.config.as_deref(), cli.database)?;

    match cli.command {
        Commands::Crawl {
            only,
            no_merge,
            json,
        } => {
            commands::crawl(&ctx, &only, no_merge, json).await?;
        }
        Commands::Merge { path } => {
            commands::merge(&ctx, &path)?;
        }
        Commands::List { source, limit } => {
            commands::list_articles(&ctx, source.as_deref(), limit)?;
        }
        Commands::Stats => {
            commands::stats(&ctx)?;
        }
    }

    Ok(())
}
