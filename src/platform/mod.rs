//! Bridge platform: discovery and the shared refresh context.
//!
//! [`Platform`] owns everything the accessories share: the controller
//! client, the state store and the refresh coalescer. It is created once and
//! handed to every accessory, replacing any process-wide state.

pub mod refresh;

pub use refresh::{RefreshCoalescer, RefreshOutcome};

use crate::accessory::{
    AccessoryHandler, AccessoryInformation, AccessoryStateStore, CircuitAccessory, EntityKind,
    SensorKind, TemperatureAccessory, TrackedEntity,
};
use crate::config::BridgeConfig;
use crate::controller::{CircuitId, DeviceConfig, PoolController};
use crate::error::{BridgeError, Result};
use log::{info, warn};
use parking_lot::RwLock;
use std::sync::Arc;
use strum::IntoEnumIterator;

pub struct Platform {
    config: BridgeConfig,
    controller: Arc<dyn PoolController>,
    store: Arc<AccessoryStateStore>,
    coalescer: Arc<RefreshCoalescer>,
    /// Controller config with hidden circuits removed, set by `discover`
    device: RwLock<Option<DeviceConfig>>,
}

impl Platform {
    pub fn new(config: BridgeConfig, controller: Arc<dyn PoolController>) -> Arc<Self> {
        let store = Arc::new(AccessoryStateStore::new());
        let coalescer = RefreshCoalescer::new(controller.clone(), store.clone());
        Arc::new(Self {
            config,
            controller,
            store,
            coalescer,
            device: RwLock::new(None),
        })
    }

    /// Read the controller config and build the tracked entity set.
    ///
    /// Returns Pool, Spa and Air sensors followed by one entity per visible
    /// circuit, after one status refresh. A failing config read is returned
    /// as an error; a failing refresh only leaves the entities faulted.
    pub async fn discover(&self) -> Result<Vec<TrackedEntity>> {
        info!("[Discovery] Fetching ScreenLogic info...");

        let mut device = self
            .controller
            .get_config()
            .await
            .map_err(BridgeError::Discovery)?;

        let hidden = self.config.hidden_circuit_names();
        device.circuits.retain(|circuit| !hidden.contains(&circuit.name));

        info!(
            "[Discovery] Connected: {} {}",
            device.gateway_name, device.software_version
        );

        let mut entities: Vec<TrackedEntity> = SensorKind::iter()
            .map(TrackedEntity::temperature_sensor)
            .collect();
        entities.extend(
            device
                .circuits
                .iter()
                .map(|circuit| TrackedEntity::circuit(circuit.id, circuit.name.clone())),
        );

        self.store.install(entities, device.is_celsius);
        *self.device.write() = Some(device);

        if let Err(err) = self.coalescer.request_refresh().await {
            warn!(
                "[Discovery] Initial refresh failed, accessories are faulted: {}",
                err
            );
        }

        let entities = self.store.entities();
        info!("[Discovery] Found {} accessories", entities.len());
        Ok(entities)
    }

    /// Discover and wrap every entity in its host-facing handler.
    pub async fn accessories(self: &Arc<Self>) -> Result<Vec<Arc<dyn AccessoryHandler>>> {
        let entities = self.discover().await?;
        let device = self
            .device()
            .ok_or_else(|| BridgeError::InvalidConfig("discovery did not complete".to_string()))?;

        let accessories = entities
            .iter()
            .enumerate()
            .map(|(index, entity)| {
                let information = AccessoryInformation::new(&device, entity.name());
                let handler: Arc<dyn AccessoryHandler> = match &entity.kind {
                    EntityKind::TemperatureSensor(kind) => Arc::new(TemperatureAccessory::new(
                        self.clone(),
                        index,
                        *kind,
                        information,
                    )),
                    EntityKind::Circuit { id, .. } => Arc::new(CircuitAccessory::new(
                        self.clone(),
                        index,
                        *id,
                        information,
                    )),
                };
                handler
            })
            .collect();

        Ok(accessories)
    }

    /// Refresh status through the coalescer.
    pub async fn request_refresh(&self) -> RefreshOutcome {
        self.coalescer.request_refresh().await
    }

    /// Switch a circuit. Not coalesced; every call reaches the controller.
    pub async fn set_circuit_state(&self, id: CircuitId, on: bool) -> Result<()> {
        self.controller.set_circuit_state(id, on).await?;
        Ok(())
    }

    /// Controller config as seen at discovery (hidden circuits removed).
    pub fn device(&self) -> Option<DeviceConfig> {
        self.device.read().clone()
    }

    pub fn store(&self) -> &Arc<AccessoryStateStore> {
        &self.store
    }

    pub fn coalescer(&self) -> &Arc<RefreshCoalescer> {
        &self.coalescer
    }
}
