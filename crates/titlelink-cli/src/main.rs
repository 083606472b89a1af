mod cli;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::TitleLinkConfig;
use tracing::debug;

fn main() -> Result<()> {
    // Initialize tracing. Stdout carries rewritten text, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = TitleLinkConfig::load_or_default(&cli.config)?;
    if let Some(catalog) = cli.catalog {
        config.catalog.path = Some(catalog);
    }
    debug!("Config: {:?}", config);

    match cli.command {
        Commands::Rewrite(args) => cli::rewrite::run(args, &config),
        Commands::Check => cli::check::run(&config, &cli.config),
        Commands::Templates => cli::templates::run(&config),
    }
}
