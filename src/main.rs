use anyhow::Result;
use mimalloc::MiMalloc;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use eth_block_browser::config::Config;
use eth_block_browser::core::{Browser, MetricsCollector, Web3Provider};
use eth_block_browser::ui::{self, App};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    // The terminal belongs to the UI, so logs go to a file
    init_logging(&config)?;

    let metrics = MetricsCollector::new(config.metrics_port)?;
    let provider = Arc::new(Web3Provider::new(&config.endpoint()?)?);
    let browser = Browser::new(provider, metrics);

    let mut app = App::new(browser, &config);
    app.mount(config.start_block);
    ui::run(&mut app)?;

    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(file))
        .init();
    Ok(())
}
