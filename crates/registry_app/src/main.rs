use std::io::BufWriter;
use std::str::FromStr;

use anyhow::Context;
use log::LevelFilter;
use registry_app::config::{config_path, load_config};
use registry_app::logging::{self, LogDestination};
use registry_app::runner;
use registry_engine::{Crawler, FormSession, SessionSettings};
use registry_logging::registry_info;

/// Environment variable overriding the log level (`debug`, `trace`, ...).
const LOG_LEVEL_ENV: &str = "REGISTRY_LOG";

fn main() -> anyhow::Result<()> {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| LevelFilter::from_str(&value).ok())
        .unwrap_or(LevelFilter::Info);
    logging::initialize(LogDestination::Both, level);

    let config = load_config(&config_path());
    registry_info!(
        "Running {} searches against {}",
        config.searches.len(),
        config.site.base_url
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;
    runtime.block_on(async {
        let session = FormSession::new(SessionSettings::default())?;
        let mut crawler = Crawler::new(session, config.site.clone());
        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        runner::run(&mut crawler, &config, &mut out).await?;
        Ok::<(), anyhow::Error>(())
    })
}
