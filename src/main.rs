use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

mod api;
mod bootstrap;
mod cli;
mod command;
mod config;
mod error;
mod host;
mod loader;
mod render;
mod session;

use api::ConfigClient;
use bootstrap::ModeResolver;
use cli::{Cli, Commands};
use config::BootstrapConfig;
use host::Host;
use loader::{HttpSurfaceFactory, LoaderOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = BootstrapConfig::load(cli.config.as_deref())?.with_overrides(
        cli.flag_url,
        cli.locator_url,
        cli.auto_fallback,
    );
    config.validate()?;

    let command = cli.command.unwrap_or(Commands::Run);
    if command == Commands::Config {
        return command::run_config(&config).await;
    }

    let client = ConfigClient::new(config.request_timeout())?;
    debug!("Request session: {}", client.session_id());
    let resolver = ModeResolver::new(
        client,
        config.flag_endpoint()?,
        config.locator_endpoint()?,
    );

    match command {
        Commands::Resolve => command::run_resolve(&resolver).await,
        Commands::Run | Commands::Config => {
            let surfaces = HttpSurfaceFactory::new(
                config.surface_user_agent.clone(),
                config.request_timeout(),
            );
            let host = Host::new(
                resolver,
                Box::new(surfaces),
                LoaderOptions::from_config(&config),
                config.auto_fallback,
            );
            command::run_app(host).await
        }
    }
}
