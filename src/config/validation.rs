use anyhow::Result;
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use garde::Validate;

use super::AppConfig;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "profile-authz", about = "Profile and role resolution service")]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, env = "APP_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    /// Server port
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Environment name
    #[arg(long, env = "ENVIRONMENT")]
    pub environment: Option<String>,
}

/// Build the layered configuration without validating it
///
/// Precedence, lowest first: embedded defaults, `config/default.toml`,
/// `config/{environment}.toml`, an explicit `--config` file, `APP_*`
/// environment variables, then CLI flags. The selected environment name is
/// also written to `environment`.
pub fn build_figment(cli: &Cli) -> Figment {
    let selected = cli
        .environment
        .clone()
        .or_else(|| std::env::var("ENVIRONMENT").ok())
        .map(|name| name.to_lowercase());
    let env_name = selected.clone().unwrap_or_else(|| "production".to_string());

    let mut figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file("config/default.toml"))
        .merge(Toml::file(format!("config/{}.toml", env_name)));

    if let Some(path) = &cli.config {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("APP_").split("__"));

    // An explicitly selected environment also names the running profile
    if let Some(name) = selected {
        figment = figment.merge(Serialized::default("environment", name));
    }

    if let Some(port) = cli.port {
        figment = figment.merge(Serialized::default("server.port", port));
    }

    figment
}

/// Load and validate configuration
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    let config: AppConfig = build_figment(cli).extract()?;

    config.validate()?;

    Ok(config)
}
