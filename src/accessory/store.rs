//! Shared accessory state, updated once per completed status fetch.

use super::entity::{EntityKind, EntityValue, SensorKind, TrackedEntity};
use crate::controller::DeviceStatus;
use crate::error::ControllerError;
use crate::temperature;
use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::RwLock;

struct StoreState {
    is_celsius: bool,
    entities: Vec<TrackedEntity>,
    last_updated: Option<DateTime<Utc>>,
}

/// Latest normalized state of every tracked entity.
///
/// A single lock covers the whole entity set, so readers always see the
/// result of one complete `apply` and never a half-updated mix.
pub struct AccessoryStateStore {
    state: RwLock<StoreState>,
}

impl AccessoryStateStore {
    /// Create an empty store. Entities are installed at discovery.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                is_celsius: true,
                entities: Vec::new(),
                last_updated: None,
            }),
        }
    }

    /// Replace the tracked entity set and record the controller's unit.
    pub fn install(&self, entities: Vec<TrackedEntity>, is_celsius: bool) {
        let mut state = self.state.write();
        state.entities = entities;
        state.is_celsius = is_celsius;
        state.last_updated = None;
    }

    /// Apply the outcome of one status fetch to every entity.
    ///
    /// On error every entity is marked faulted and keeps its last value.
    /// On success every entity is cleared and refreshed.
    pub fn apply(&self, outcome: Result<&DeviceStatus, &ControllerError>) {
        let mut state = self.state.write();
        let is_celsius = state.is_celsius;

        match outcome {
            Err(err) => {
                debug!(
                    "[Store] Marking {} accessories faulted: {}",
                    state.entities.len(),
                    err
                );
                for entity in state.entities.iter_mut() {
                    entity.set_faulted(true);
                }
            }
            Ok(status) => {
                for entity in state.entities.iter_mut() {
                    let (value, active) = reading_for(&entity.kind, status, is_celsius);
                    entity.update(value, active);
                }
                state.last_updated = Some(Utc::now());
            }
        }
    }

    /// Snapshot of all entities in discovery order.
    pub fn entities(&self) -> Vec<TrackedEntity> {
        self.state.read().entities.clone()
    }

    pub fn entity(&self, index: usize) -> Option<TrackedEntity> {
        self.state.read().entities.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_celsius(&self) -> bool {
        self.state.read().is_celsius
    }

    /// Time of the last successful apply.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.read().last_updated
    }
}

impl Default for AccessoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

fn reading_for(kind: &EntityKind, status: &DeviceStatus, is_celsius: bool) -> (EntityValue, bool) {
    match kind {
        EntityKind::TemperatureSensor(sensor) => {
            let (raw, active) = match sensor {
                SensorKind::Pool => (status.pool_temperature, status.is_pool_active),
                SensorKind::Spa => (status.spa_temperature, status.is_spa_active),
                SensorKind::Air => (status.air_temperature, true),
            };
            (
                EntityValue::Celsius(temperature::normalize(raw, is_celsius)),
                active,
            )
        }
        EntityKind::Circuit { id, .. } => (EntityValue::On(status.circuit_on(*id)), true),
    }
}
