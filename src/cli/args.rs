use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// farmgate - launch bootstrap for the poultry farm app
#[derive(Parser)]
#[command(name = "farmgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file (defaults to ~/.farmgate/config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Remote flag endpoint
    #[arg(long, env = "FARMGATE_FLAG_URL")]
    pub flag_url: Option<String>,

    /// Remote locator endpoint
    #[arg(long, env = "FARMGATE_LOCATOR_URL")]
    pub locator_url: Option<String>,

    /// Switch to native as soon as remote content gives up
    #[arg(long)]
    pub auto_fallback: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Commands {
    /// Resolve the mode and run the app (default)
    Run,
    /// Resolve the mode once, print the outcome and exit
    Resolve,
    /// Print the effective configuration
    Config,
}
