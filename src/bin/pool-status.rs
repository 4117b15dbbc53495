//! One-shot status dump.
//!
//! Usage:
//!   cargo run --bin pool-status
//!   cargo run --bin pool-status -- --hidden-circuits "Spa Light, Waterfall"
//!
//! Runs discovery once (including the initial refresh) and prints every
//! accessory with its current state as JSON.

use clap::Parser;
use log::error;
use screenlogic_bridge::config::{Config, load_dotenv};
use screenlogic_bridge::controller::SimulatedController;
use screenlogic_bridge::temperature::celsius_to_fahrenheit;
use screenlogic_bridge::{Platform, Result};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pool-status")]
#[command(about = "Print ScreenLogic accessories and their state as JSON")]
struct Cli {
    /// JSON config file (defaults to the user config directory)
    #[arg(long, env = "SCREENLOGIC_CONFIG")]
    config: Option<PathBuf>,

    /// Comma-separated circuit names to leave out
    #[arg(long)]
    hidden_circuits: Option<String>,

    /// Also report temperatures in Fahrenheit
    #[arg(long)]
    fahrenheit: bool,
}

fn main() {
    load_dotenv();
    // Logs go to stderr, keep them quiet so stdout stays clean JSON
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    match runtime.block_on(status(cli)) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn status(cli: Cli) -> Result<String> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(hidden) = cli.hidden_circuits {
        config.bridge.hidden_circuits = hidden;
    }

    let controller = Arc::new(SimulatedController::new(&config.simulation));
    let platform = Platform::new(config.bridge, controller);

    let accessories = platform.accessories().await?;
    let mut entries = Vec::with_capacity(accessories.len());
    for accessory in &accessories {
        let state = accessory.cached()?;
        let mut entry = json!({
            "information": accessory.information(),
            "state": state,
        });
        if cli.fahrenheit
            && let Some(celsius) = state.temperature()
        {
            entry["fahrenheit"] = json!(celsius_to_fahrenheit(celsius));
        }
        entries.push(entry);
    }

    let output = json!({
        "device": platform.device(),
        "last_updated": platform.store().last_updated(),
        "accessories": entries,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}
