//! In-memory pool controller for running the bridge without hardware.
//!
//! Temperatures drift a little on every poll, circuits remember the last
//! state written to them, and a configurable share of polls fail so the
//! fault path can be watched end to end.

use super::{Circuit, CircuitId, DeviceConfig, DeviceStatus, PoolController};
use crate::config::SimulationConfig;
use crate::error::ControllerError;
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;

/// Maximum temperature change per poll, in controller units.
const DRIFT: f64 = 0.2;

struct SimulatedState {
    air_temperature: f64,
    pool_temperature: f64,
    spa_temperature: f64,
    circuit_state: HashMap<CircuitId, bool>,
}

/// Simulated pool controller.
pub struct SimulatedController {
    device: DeviceConfig,
    latency: Duration,
    failure_rate: f64,
    state: Mutex<SimulatedState>,
}

impl SimulatedController {
    pub fn new(config: &SimulationConfig) -> Self {
        let circuits: Vec<Circuit> = config
            .circuits
            .iter()
            .enumerate()
            .map(|(index, name)| Circuit::new(500 + index as CircuitId, name.clone()))
            .collect();

        let circuit_state = circuits.iter().map(|c| (c.id, false)).collect();

        Self {
            device: DeviceConfig {
                gateway_name: config.gateway_name.clone(),
                software_version: config.software_version.clone(),
                is_celsius: config.is_celsius,
                circuits,
            },
            latency: Duration::from_millis(config.latency_ms),
            failure_rate: config.failure_rate.clamp(0.0, 1.0),
            state: Mutex::new(SimulatedState {
                air_temperature: config.air_temperature,
                pool_temperature: config.pool_temperature,
                spa_temperature: config.spa_temperature,
                circuit_state,
            }),
        }
    }

    fn body_active(&self, state: &SimulatedState, body: &str) -> bool {
        self.device
            .circuits
            .iter()
            .filter(|c| c.name == body)
            .any(|c| state.circuit_state.get(&c.id).copied().unwrap_or(false))
    }

    /// Advance the simulation by one poll and take a snapshot.
    fn next_status(&self) -> Result<DeviceStatus, ControllerError> {
        let mut rng = rand::thread_rng();
        if rng.gen_bool(self.failure_rate) {
            return Err(ControllerError::Timeout(
                "simulated controller did not answer".to_string(),
            ));
        }

        let mut state = self.state.lock();
        state.air_temperature += rng.gen_range(-DRIFT..=DRIFT);
        state.pool_temperature += rng.gen_range(-DRIFT..=DRIFT);
        state.spa_temperature += rng.gen_range(-DRIFT..=DRIFT);

        Ok(DeviceStatus {
            air_temperature: state.air_temperature,
            pool_temperature: state.pool_temperature,
            spa_temperature: state.spa_temperature,
            is_pool_active: self.body_active(&state, "Pool"),
            is_spa_active: self.body_active(&state, "Spa"),
            circuit_state: state.circuit_state.clone(),
        })
    }
}

#[async_trait]
impl PoolController for SimulatedController {
    async fn get_config(&self) -> Result<DeviceConfig, ControllerError> {
        tokio::time::sleep(self.latency).await;
        Ok(self.device.clone())
    }

    async fn get_status(&self) -> Result<DeviceStatus, ControllerError> {
        tokio::time::sleep(self.latency).await;
        let status = self.next_status();
        debug!("[Sim] Status poll: {:?}", status.as_ref().map(|_| "ok"));
        status
    }

    async fn set_circuit_state(&self, id: CircuitId, on: bool) -> Result<(), ControllerError> {
        tokio::time::sleep(self.latency).await;
        let mut state = self.state.lock();
        match state.circuit_state.get_mut(&id) {
            Some(current) => {
                *current = on;
                info!("[Sim] Circuit {} switched {}", id, if on { "on" } else { "off" });
                Ok(())
            }
            None => Err(ControllerError::Protocol(format!("unknown circuit id {}", id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimulationConfig {
        SimulationConfig {
            circuits: vec!["Pool".to_string(), "Spa".to_string(), "Spa Light".to_string()],
            latency_ms: 0,
            failure_rate: 0.0,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_config_lists_circuits_in_order() {
        let controller = SimulatedController::new(&config());
        let device = tokio_test::block_on(controller.get_config()).unwrap();
        let names: Vec<_> = device.circuits.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Pool", "Spa", "Spa Light"]);
        assert_eq!(device.circuits[0].id, 500);
    }

    #[tokio::test]
    async fn test_set_circuit_state_reflected_in_status() {
        let controller = SimulatedController::new(&config());
        let status = controller.get_status().await.unwrap();
        assert!(!status.is_spa_active);
        assert!(!status.circuit_on(501));

        controller.set_circuit_state(501, true).await.unwrap();
        let status = controller.get_status().await.unwrap();
        assert!(status.is_spa_active);
        assert!(!status.is_pool_active);
        assert!(status.circuit_on(501));
    }

    #[tokio::test]
    async fn test_unknown_circuit_rejected() {
        let controller = SimulatedController::new(&config());
        let err = controller.set_circuit_state(42, true).await.unwrap_err();
        assert!(matches!(err, ControllerError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let controller = SimulatedController::new(&SimulationConfig {
            failure_rate: 1.0,
            ..config()
        });
        let err = controller.get_status().await.unwrap_err();
        assert!(matches!(err, ControllerError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_temperature_drift_is_bounded() {
        let cfg = config();
        let controller = SimulatedController::new(&cfg);
        let status = controller.get_status().await.unwrap();
        assert!((status.pool_temperature - cfg.pool_temperature).abs() <= DRIFT);
        assert!((status.air_temperature - cfg.air_temperature).abs() <= DRIFT);
    }
}
