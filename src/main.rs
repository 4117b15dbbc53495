use clap::Parser;
use futures_util::future::join_all;
use log::{error, info, warn};
use screenlogic_bridge::accessory::AccessoryHandler;
use screenlogic_bridge::config::{Config, load_dotenv};
use screenlogic_bridge::controller::SimulatedController;
use screenlogic_bridge::{Platform, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "screenlogic-bridge")]
#[command(about = "Expose a ScreenLogic pool controller as home-automation accessories")]
struct Cli {
    /// JSON config file (defaults to the user config directory)
    #[arg(long, env = "SCREENLOGIC_CONFIG")]
    config: Option<PathBuf>,

    /// Comma-separated circuit names that should not become accessories
    #[arg(long)]
    hidden_circuits: Option<String>,

    /// Seconds between accessory refreshes
    #[arg(long)]
    poll_interval: Option<u64>,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    // Load .env file before the runtime spawns any threads
    load_dotenv();
    init_logger();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting ScreenLogic bridge");

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(hidden) = cli.hidden_circuits {
        config.bridge.hidden_circuits = hidden;
    }
    if let Some(interval) = cli.poll_interval {
        config.bridge.poll_interval_secs = interval;
    }
    config.validate()?;

    info!("Configuration loaded:");
    info!("  Hidden circuits: {:?}", config.bridge.hidden_circuits);
    info!("  Poll interval: {}s", config.bridge.poll_interval_secs);
    info!("  Controller: simulated ({})", config.simulation.gateway_name);

    let controller = Arc::new(SimulatedController::new(&config.simulation));
    let platform = Platform::new(config.bridge.clone(), controller);

    let accessories = platform.accessories().await?;
    for accessory in &accessories {
        info!(
            "  - {} [{}]",
            accessory.name(),
            accessory.information().uuid
        );
    }

    let shutdown = CancellationToken::new();
    let poller = tokio::spawn(poll_accessories(
        accessories,
        Duration::from_secs(config.bridge.poll_interval_secs),
        shutdown.clone(),
    ));

    info!("ScreenLogic bridge is running");
    info!("  - Press Ctrl+C to exit");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    shutdown.cancel();
    if let Err(e) = poller.await {
        warn!("Poll task ended abnormally: {}", e);
    }

    info!("ScreenLogic bridge stopped");
    Ok(())
}

/// Read every accessory concurrently on each tick, the way a host polling
/// all of its characteristics would. The coalescer turns each round into a
/// single controller poll.
async fn poll_accessories(
    accessories: Vec<Arc<dyn AccessoryHandler>>,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        let readings = join_all(accessories.iter().map(|accessory| accessory.read())).await;
        for (accessory, reading) in accessories.iter().zip(readings) {
            match reading {
                Ok(entity) if entity.faulted => {
                    warn!("[Poll] {}: {} (stale, faulted)", accessory.name(), entity.value);
                }
                Ok(entity) => {
                    info!(
                        "[Poll] {}: {}{}",
                        accessory.name(),
                        entity.value,
                        if entity.active { "" } else { " (inactive)" }
                    );
                }
                Err(e) => {
                    error!("[Poll] {}: {}", accessory.name(), e);
                }
            }
        }
    }
}
