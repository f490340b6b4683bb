//! `batchdl config` – show where the config lives and what it says.

use anyhow::Result;
use batchdl_core::config::{config_path, BatchConfig};

pub fn run_config(cfg: &BatchConfig) -> Result<()> {
    println!("# {}", config_path()?.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
