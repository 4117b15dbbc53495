use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            if (value.starts_with('"') && value.ends_with('"') && value.len() >= 2)
                || (value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2)
            {
                value = &value[1..value.len() - 1];
            }

            // Real environment wins over .env
            if std::env::var(key).is_err() {
                // SAFETY: called from main before the async runtime starts any threads
                unsafe { std::env::set_var(key, value) };
            }
        }
    }
}

/// Split a comma-separated circuit list into trimmed names.
///
/// Empty entries are dropped, so an empty string hides nothing.
pub fn parse_hidden_circuits(list: &str) -> HashSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bridge: BridgeConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Comma-separated names of circuits that should not become accessories
    pub hidden_circuits: String,
    /// Seconds between background refreshes in the bridge binary
    pub poll_interval_secs: u64,
}

impl BridgeConfig {
    pub fn hidden_circuit_names(&self) -> HashSet<String> {
        parse_hidden_circuits(&self.hidden_circuits)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            hidden_circuits: String::new(),
            poll_interval_secs: 30,
        }
    }
}

/// Settings for the in-memory controller used when no hardware is attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub gateway_name: String,
    pub software_version: String,
    pub is_celsius: bool,
    pub circuits: Vec<String>,
    pub latency_ms: u64,
    /// Share of status polls that fail, 0.0 to 1.0
    pub failure_rate: f64,
    pub air_temperature: f64,
    pub pool_temperature: f64,
    pub spa_temperature: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gateway_name: "Pentair: 00-00-00".to_string(),
            software_version: "POOL: 5.2 Build 736.0 Rel".to_string(),
            is_celsius: false,
            circuits: vec![
                "Spa".to_string(),
                "Pool".to_string(),
                "Pool Light".to_string(),
                "Spa Light".to_string(),
                "Waterfall".to_string(),
            ],
            latency_ms: 250,
            failure_rate: 0.0,
            air_temperature: 72.0,
            pool_temperature: 79.7,
            spa_temperature: 101.0,
        }
    }
}

impl Config {
    /// Default config file location, e.g. `~/.config/screenlogic-bridge/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("screenlogic-bridge").join("config.json"))
    }

    /// Read a JSON config file. Missing sections fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration: defaults, then the JSON file, then environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        let config = config.apply_env_with(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        Self::default().apply_env_with(|key| std::env::var(key).ok())
    }

    /// Override fields from variables resolved by `var`.
    pub fn apply_env_with(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(hidden) = var("HIDDEN_CIRCUITS") {
            self.bridge.hidden_circuits = hidden;
        }
        if let Some(interval) = var("POLL_INTERVAL_SECS")
            && let Ok(i) = interval.parse()
        {
            self.bridge.poll_interval_secs = i;
        }

        // Simulated controller
        if let Some(name) = var("SIM_GATEWAY_NAME") {
            self.simulation.gateway_name = name;
        }
        if let Some(celsius) = var("SIM_CELSIUS")
            && let Ok(c) = celsius.parse()
        {
            self.simulation.is_celsius = c;
        }
        if let Some(circuits) = var("SIM_CIRCUITS") {
            self.simulation.circuits = circuits
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(latency) = var("SIM_LATENCY_MS")
            && let Ok(l) = latency.parse()
        {
            self.simulation.latency_ms = l;
        }
        if let Some(rate) = var("SIM_FAILURE_RATE")
            && let Ok(r) = rate.parse()
        {
            self.simulation.failure_rate = r;
        }

        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.bridge.poll_interval_secs == 0 {
            return Err(BridgeError::InvalidConfig(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.simulation.failure_rate) {
            return Err(BridgeError::InvalidConfig(format!(
                "failure_rate must be between 0 and 1, got {}",
                self.simulation.failure_rate
            )));
        }
        Ok(())
    }
}
