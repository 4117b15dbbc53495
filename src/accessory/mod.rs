//! Accessories exposed to the host automation framework.
//!
//! - `entity`: tracked temperature sensors and circuits
//! - `store`: shared state updated from controller status
//! - `handler`: read/write hooks the host calls
//! - `info`: manufacturer, model and serial reported per accessory

pub mod entity;
pub mod handler;
pub mod info;
pub mod store;

pub use entity::{EntityKind, EntityValue, SensorKind, TrackedEntity};
pub use handler::{AccessoryHandler, CircuitAccessory, TemperatureAccessory};
pub use info::AccessoryInformation;
pub use store::AccessoryStateStore;
