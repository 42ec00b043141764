use serde::Deserialize;
use std::path::PathBuf;
use anyhow::Result;
use config::{Config as ConfigSource, Environment, File};

use crate::utils::error::BrowserError;

/// Page sizes offered by the transaction grid.
pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Full JSON-RPC URL. Takes precedence over `network` + `api_key`.
    pub rpc_endpoint: Option<String>,
    pub api_key: Option<String>,
    pub network: String,
    pub start_block: Option<u64>,
    pub page_size: usize,
    pub detail_indent: usize,
    pub log_file: PathBuf,
    pub metrics_port: Option<u16>,
}

impl Config {
    /// Defaults, then `browser.toml` if present, then `BROWSER_*` variables.
    pub fn load() -> Result<Self> {
        let env = Environment::with_prefix("BROWSER").try_parsing(true);
        Self::from_sources(Some("browser"), env)
    }

    fn from_sources(file: Option<&str>, env: Environment) -> Result<Self> {
        let mut builder = ConfigSource::builder()
            .set_default("network", "eth-mainnet")?
            .set_default("page_size", 10_i64)?
            .set_default("detail_indent", 4_i64)?
            .set_default("log_file", "block-browser.log")?;

        if let Some(name) = file {
            builder = builder.add_source(File::with_name(name).required(false));
        }

        let mut config: Config = builder
            .add_source(env)
            .build()?
            .try_deserialize()?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("ALCHEMY_API_KEY").ok().filter(|k| !k.is_empty());
        }
        if !PAGE_SIZES.contains(&config.page_size) {
            return Err(BrowserError::ConfigError(format!(
                "page_size must be one of {:?}, got {}",
                PAGE_SIZES, config.page_size
            ))
            .into());
        }

        Ok(config)
    }

    /// JSON-RPC endpoint the provider connects to.
    pub fn endpoint(&self) -> Result<String, BrowserError> {
        if let Some(url) = self.rpc_endpoint.as_deref().filter(|u| !u.is_empty()) {
            return Ok(url.to_string());
        }
        match self.api_key.as_deref() {
            Some(key) => Ok(format!("https://{}.g.alchemy.com/v2/{}", self.network, key)),
            None => Err(BrowserError::ConfigError(
                "set BROWSER_RPC_ENDPOINT or an API key (BROWSER_API_KEY / ALCHEMY_API_KEY)".into(),
            )),
        }
    }
}
