//! Service config loader (strict YAML + environment overrides).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use metrix_core::error::{MetrixError, Result};

pub use schema::{AppConfig, AuthSection, ServerSection, StoreSection};

/// Config file used when `METRIX_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "metrix.yaml";

/// Load from `METRIX_CONFIG` (or `metrix.yaml`) plus process environment.
pub fn load() -> Result<AppConfig> {
    let path = std::env::var("METRIX_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    load_with_env(&path, |k| std::env::var(k).ok())
}

/// A missing file means "environment only"; any other read error is fatal.
pub fn load_with_env<F>(path: &str, var: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match fs::read_to_string(path) {
        Ok(s) => parse_str(&s)?,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(%path, "config file not found, using defaults + environment");
            AppConfig::default()
        }
        Err(e) => return Err(MetrixError::Config(format!("read config failed: {e}"))),
    };
    cfg.apply_env(var)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_str(s: &str) -> Result<AppConfig> {
    let cfg = parse_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

fn parse_str(s: &str) -> Result<AppConfig> {
    serde_yaml::from_str(s).map_err(|e| MetrixError::Config(format!("invalid yaml: {e}")))
}
