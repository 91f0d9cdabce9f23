use std::sync::Arc;

use bookcase::api::{BookApi, HttpClient};
use bookcase::catalog::{BookQueries, CatalogApp, CatalogFlags};
use bookcase::config::Config;
use bookcase::runtime::Runtime;
use bookcase::subscription::http::QueryClient;
use bookcase::telemetry;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let config = Config::parse();

    telemetry::init(config.log_file.as_deref(), config.log_level)
        .wrap_err("failed to set up logging")?;

    let http = HttpClient::new(&config.api_url).wrap_err("invalid --api-url")?;
    let client = Arc::new(QueryClient::with_config(config.query_config()));
    let queries = BookQueries::new(BookApi::new(http), client).with_stale_time(config.stale_time());

    let mut flags = CatalogFlags::new(queries);
    if let Some(interval) = config.poll_interval() {
        flags = flags.poll_every(interval);
    }

    info!(api_url = %config.api_url, "starting bookcase");

    let mut terminal = ratatui::init();
    let result = Runtime::<CatalogApp>::new(flags)
        .run(&mut terminal, config.frame_rate)
        .await;
    ratatui::restore();

    result
}
