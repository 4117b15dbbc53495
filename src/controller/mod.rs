//! Pool controller client boundary.
//!
//! The physical protocol lives behind [`PoolController`]. The bridge only needs
//! the three operations below; everything else about the device is opaque.

#[cfg(test)]
pub(crate) mod mock;
pub mod simulated;

use crate::error::ControllerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use simulated::SimulatedController;

/// Circuit identifier as reported by the controller.
pub type CircuitId = u32;

/// A switchable circuit (pump, light, waterfall, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circuit {
    pub id: CircuitId,
    pub name: String,
}

impl Circuit {
    pub fn new(id: CircuitId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Static controller configuration, read once at discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Gateway name, e.g. "Pentair: 12-34-56"
    pub gateway_name: String,
    pub software_version: String,
    /// Unit of every temperature in [`DeviceStatus`]
    pub is_celsius: bool,
    /// Circuits in controller order
    pub circuits: Vec<Circuit>,
}

impl DeviceConfig {
    /// Gateway identifier without the vendor prefix.
    pub fn device_id(&self) -> &str {
        self.gateway_name
            .strip_prefix("Pentair: ")
            .unwrap_or(&self.gateway_name)
    }
}

/// One status snapshot. Temperatures are in controller units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub air_temperature: f64,
    pub pool_temperature: f64,
    pub spa_temperature: f64,
    pub is_pool_active: bool,
    pub is_spa_active: bool,
    pub circuit_state: HashMap<CircuitId, bool>,
}

impl DeviceStatus {
    /// Circuit on/off state. Circuits missing from the snapshot are off.
    pub fn circuit_on(&self, id: CircuitId) -> bool {
        self.circuit_state.get(&id).copied().unwrap_or(false)
    }
}

/// Client for a physical pool controller.
#[async_trait]
pub trait PoolController: Send + Sync + 'static {
    /// Read the controller configuration (unit, circuits, identity).
    async fn get_config(&self) -> Result<DeviceConfig, ControllerError>;

    /// Poll the current status.
    async fn get_status(&self) -> Result<DeviceStatus, ControllerError>;

    /// Switch a circuit on or off.
    async fn set_circuit_state(&self, id: CircuitId, on: bool) -> Result<(), ControllerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_strips_vendor_prefix() {
        let config = DeviceConfig {
            gateway_name: "Pentair: 12-34-56".to_string(),
            software_version: "POOL: 5.2 Build 736.0 Rel".to_string(),
            is_celsius: false,
            circuits: vec![],
        };
        assert_eq!(config.device_id(), "12-34-56");

        let config = DeviceConfig {
            gateway_name: "Backyard".to_string(),
            ..config
        };
        assert_eq!(config.device_id(), "Backyard");
    }

    #[test]
    fn test_missing_circuit_is_off() {
        let status = DeviceStatus {
            circuit_state: HashMap::from([(2, true), (3, false)]),
            ..Default::default()
        };
        assert!(status.circuit_on(2));
        assert!(!status.circuit_on(3));
        assert!(!status.circuit_on(5));
    }
}
