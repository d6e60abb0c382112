use anyhow::{Context, Result};

use crate::config::BootstrapConfig;

pub async fn run_config(config: &BootstrapConfig) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
    println!("{}", rendered);
    Ok(())
}
