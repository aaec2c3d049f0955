use anyhow::Result;
use clap::Parser;
use tracing::info;

use profile_authz::config::{Cli, load_config};
use profile_authz::logging::{install_panic_hook, setup_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Logging first, then the panic hook so it can log
    setup_tracing(&config.logging)?;
    install_panic_hook();

    info!(environment = config.environment.as_str(), "profile-authz starting up");

    profile_authz::run(config).await
}
