pub mod check;
pub mod rewrite;
pub mod templates;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "titlelink")]
#[command(version, about = "Link page titles in rendered text")]
pub struct Cli {
    /// Path to titlelink.toml
    #[arg(
        long,
        global = true,
        env = "TITLELINK_CONFIG",
        default_value = "titlelink.toml"
    )]
    pub config: PathBuf,

    /// JSON page catalog (overrides config file)
    #[arg(long, global = true, env = "TITLELINK_CATALOG")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Link page titles in one or more documents
    Rewrite(RewriteArgs),
    /// Validate the config file and page catalog
    Check,
    /// List templates that can be selected for auto-linking
    Templates,
}

#[derive(Args, Debug, Default)]
pub struct RewriteArgs {
    /// Input files. Reads stdin when none are given.
    pub inputs: Vec<PathBuf>,

    /// Output file for a single input (stdout otherwise)
    #[arg(short, long, conflicts_with = "out_dir")]
    pub output: Option<PathBuf>,

    /// Output directory, required for several inputs
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Page being rendered; excluded from linking
    #[arg(long, env = "TITLELINK_CURRENT_PAGE")]
    pub current_page: Option<i64>,

    /// Template ids to link (overrides config file)
    #[arg(long, value_delimiter = ',')]
    pub templates: Vec<i64>,

    /// Write the full result (text, links, warnings) as JSON
    #[arg(long)]
    pub json: bool,
}
