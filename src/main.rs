use anyhow::Result;
use clap::Parser;
use log::{debug, info};

mod cli;

use cli::Cli;
use hubspot_crm::{Config, Crm};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config first so its log level can seed the logger; RUST_LOG still wins
    let config = Config::load_with_env()?;
    env_logger::Builder::new()
        .filter_level(config.log_level().to_level_filter())
        .parse_default_env()
        .init();

    info!("Starting hubspot-crm");
    debug!("Using API at {}", config.base_url);

    if !config.is_configured() {
        anyhow::bail!(
            "No access token configured. Set HUBSPOT_ACCESS_TOKEN or add access_token to {}",
            Config::get_config_path()?.display()
        );
    }

    let crm = Crm::from_config(&config)?;
    cli::handle_command(cli, &crm).await
}
