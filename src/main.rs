use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use bikecast::web::{self, AppState};
use bikecast::{
    BikecastConfig, DarkSkyClient, ForecastCache, PersistentCache, hourly_forecast_key, telemetry,
};

/// Hourly weather dashboard grading the next days for a bike ride
#[derive(Parser, Debug)]
#[command(name = "bikecast", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, host:port
    #[arg(long)]
    server_addr: Option<String>,

    /// Directory holding the dashboard page
    #[arg(long)]
    static_dir: Option<String>,

    /// Dark Sky API key
    #[arg(long, env = "DARK_SKY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(self, config: &mut BikecastConfig) {
        if let Some(addr) = self.server_addr {
            config.server.addr = addr;
        }
        if let Some(dir) = self.static_dir {
            config.server.static_dir = dir;
        }
        if let Some(key) = self.api_key {
            config.provider.api_key = key;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let mut config = BikecastConfig::load_from_path(cli.config.clone())?;
    cli.apply(&mut config);

    telemetry::init(&config.logging, verbose);
    config.validate()?;

    tracing::info!(
        "Forecasting ({}, {}), cache at {}",
        config.location.latitude,
        config.location.longitude,
        config.cache.location
    );

    let source = DarkSkyClient::new(&config.provider)?;
    let store = PersistentCache::open(&config.cache.location)
        .with_context(|| format!("Failed to open cache at {}", config.cache.location))?;

    let state = Arc::new(AppState {
        forecast: ForecastCache::new(
            source,
            store,
            config.location.latitude,
            config.location.longitude,
        ),
        cache_key: hourly_forecast_key(&config.cache.prefix),
    });

    let app = web::router(state, &config.server.static_dir);
    web::run(app, &config.server.addr).await?;
    Ok(())
}
