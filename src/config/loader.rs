use std::{fs, fs::File, io::Write, path::Path};

use anyhow::{Context, Result};
use config::{Config, Environment};
use log::info;

use super::ClientConfig;

pub const ENV_PREFIX: &str = "CATALOG";

pub fn get_default_config() -> &'static str {
    include_str!("../../config/config.toml")
}

/// Loads the client configuration from `path`, writing the default file
/// first if there is none. `CATALOG_*` environment variables take precedence
/// over the file.
pub fn load_configuration(path: &Path) -> Result<ClientConfig> {
    build_configuration(path, Environment::with_prefix(ENV_PREFIX).prefix_separator("_"))
}

fn build_configuration(path: &Path, environment: Environment) -> Result<ClientConfig> {
    if !path.exists() {
        write_config_to(path, get_default_config()).context("Could not create default config")?;
        info!(path:% = path.display(); "Created new configuration file");
    }

    let filename = path.to_str().context("Invalid config file path")?;

    let cfg = Config::builder()
        .add_source(config::File::with_name(filename))
        .add_source(environment)
        .build()
        .context("Could not build config")?;

    cfg.try_deserialize().context("Invalid catalog client configuration")
}

pub fn write_config_to(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create parent directories")?;
    };

    let mut file = File::create(path).context("Failed to create config file")?;
    file.write_all(source.as_bytes())
        .context("Failed to write config content")?;
    file.write_all(b"\n").context("Failed to write newline")?;
    Ok(())
}
