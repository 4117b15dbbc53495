//! Tracked entities: the temperature sensors and circuits exposed as accessories.

use crate::controller::CircuitId;
use serde::Serialize;
use std::fmt;
use strum::{Display, EnumIter};

/// Which body of water (or the air) a temperature sensor measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
pub enum SensorKind {
    Pool,
    Spa,
    Air,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EntityKind {
    TemperatureSensor(SensorKind),
    Circuit { id: CircuitId, name: String },
}

/// Last observed value, already in canonical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum EntityValue {
    /// Degrees Celsius
    Celsius(f64),
    On(bool),
}

impl fmt::Display for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityValue::Celsius(celsius) => write!(f, "{:.1}°C", celsius),
            EntityValue::On(true) => write!(f, "on"),
            EntityValue::On(false) => write!(f, "off"),
        }
    }
}

/// A temperature sensor or circuit together with its latest state.
///
/// Only [`AccessoryStateStore::apply`](super::AccessoryStateStore::apply)
/// mutates the state; everyone else works with snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedEntity {
    pub kind: EntityKind,
    pub value: EntityValue,
    /// Whether the measured body is running (always true for air and circuits)
    pub active: bool,
    /// The most recent refresh failed; `value` is stale
    pub faulted: bool,
    /// Incremented whenever value, active or faulted changes
    pub version: u32,
}

impl TrackedEntity {
    pub fn temperature_sensor(kind: SensorKind) -> Self {
        Self {
            kind: EntityKind::TemperatureSensor(kind),
            value: EntityValue::Celsius(0.0),
            active: kind == SensorKind::Air,
            faulted: false,
            version: 0,
        }
    }

    pub fn circuit(id: CircuitId, name: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Circuit {
                id,
                name: name.into(),
            },
            value: EntityValue::On(false),
            active: true,
            faulted: false,
            version: 0,
        }
    }

    /// Display name: "Pool", "Spa", "Air" or the circuit name.
    pub fn name(&self) -> String {
        match &self.kind {
            EntityKind::TemperatureSensor(kind) => kind.to_string(),
            EntityKind::Circuit { name, .. } => name.clone(),
        }
    }

    pub fn sensor_kind(&self) -> Option<SensorKind> {
        match self.kind {
            EntityKind::TemperatureSensor(kind) => Some(kind),
            EntityKind::Circuit { .. } => None,
        }
    }

    pub fn circuit_id(&self) -> Option<CircuitId> {
        match self.kind {
            EntityKind::Circuit { id, .. } => Some(id),
            EntityKind::TemperatureSensor(_) => None,
        }
    }

    pub fn temperature(&self) -> Option<f64> {
        match self.value {
            EntityValue::Celsius(celsius) => Some(celsius),
            EntityValue::On(_) => None,
        }
    }

    pub fn is_on(&self) -> Option<bool> {
        match self.value {
            EntityValue::On(on) => Some(on),
            EntityValue::Celsius(_) => None,
        }
    }

    pub(crate) fn set_faulted(&mut self, faulted: bool) {
        if self.faulted != faulted {
            self.faulted = faulted;
            self.version = self.version.wrapping_add(1);
        }
    }

    /// Store a fresh reading and clear any fault. Returns true if anything
    /// observable changed; the version moves by one at most.
    pub(crate) fn update(&mut self, value: EntityValue, active: bool) -> bool {
        if !self.faulted && self.value == value && self.active == active {
            return false;
        }
        self.faulted = false;
        self.value = value;
        self.active = active;
        self.version = self.version.wrapping_add(1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_sensor_names() {
        let names: Vec<String> = SensorKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(names, ["Pool", "Spa", "Air"]);
    }

    #[test]
    fn test_initial_state() {
        let air = TrackedEntity::temperature_sensor(SensorKind::Air);
        assert!(air.active);
        assert!(!air.faulted);
        assert_eq!(air.version, 0);

        let pool = TrackedEntity::temperature_sensor(SensorKind::Pool);
        assert!(!pool.active);
        assert_eq!(pool.name(), "Pool");
        assert_eq!(pool.circuit_id(), None);

        let light = TrackedEntity::circuit(7, "Pool Light");
        assert_eq!(light.name(), "Pool Light");
        assert_eq!(light.circuit_id(), Some(7));
        assert_eq!(light.is_on(), Some(false));
        assert_eq!(light.temperature(), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(EntityValue::Celsius(26.54).to_string(), "26.5°C");
        assert_eq!(EntityValue::On(true).to_string(), "on");
        assert_eq!(EntityValue::On(false).to_string(), "off");
    }

    #[test]
    fn test_update_increments_version_on_change() {
        let mut spa = TrackedEntity::temperature_sensor(SensorKind::Spa);

        assert!(spa.update(EntityValue::Celsius(38.0), true));
        assert_eq!(spa.version, 1);

        // Same reading doesn't increment
        assert!(!spa.update(EntityValue::Celsius(38.0), true));
        assert_eq!(spa.version, 1);

        spa.set_faulted(true);
        spa.set_faulted(true);
        assert_eq!(spa.version, 2);
    }

    #[test]
    fn test_recovery_with_new_value_is_one_change() {
        let mut spa = TrackedEntity::temperature_sensor(SensorKind::Spa);
        spa.update(EntityValue::Celsius(38.0), true);
        spa.set_faulted(true);
        assert_eq!(spa.version, 2);

        assert!(spa.update(EntityValue::Celsius(38.5), true));
        assert!(!spa.faulted);
        assert_eq!(spa.version, 3);
    }

    #[test]
    fn test_recovery_with_same_value_clears_fault() {
        let mut spa = TrackedEntity::temperature_sensor(SensorKind::Spa);
        spa.update(EntityValue::Celsius(38.0), true);
        spa.set_faulted(true);

        assert!(spa.update(EntityValue::Celsius(38.0), true));
        assert!(!spa.faulted);
        assert_eq!(spa.version, 3);
    }
}
