//! Host-facing accessory handlers.
//!
//! Each tracked entity is exposed through an [`AccessoryHandler`]. Reads
//! refresh the controller status first (coalesced with every other reader)
//! and then report the stored state; circuit writes go straight to the
//! controller.

use super::entity::{SensorKind, TrackedEntity};
use super::info::AccessoryInformation;
use crate::controller::CircuitId;
use crate::error::{BridgeError, Result};
use crate::platform::Platform;
use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

/// Interface between one accessory and the host automation framework.
///
/// # Example
/// ```ignore
/// for accessory in platform.accessories().await? {
///     let reading = accessory.read().await?;
///     println!("{}: {:?} faulted={}", accessory.name(), reading.value, reading.faulted);
/// }
/// ```
#[async_trait]
pub trait AccessoryHandler: Send + Sync + 'static {
    fn information(&self) -> &AccessoryInformation;

    fn name(&self) -> &str {
        &self.information().name
    }

    /// Refresh controller status, then return this accessory's state.
    ///
    /// A failed refresh is not an error here: the returned state keeps the
    /// last good value and has `faulted` set.
    async fn read(&self) -> Result<TrackedEntity>;

    /// Current stored state without polling the controller.
    fn cached(&self) -> Result<TrackedEntity>;

    /// Switch the accessory on or off.
    async fn write(&self, _on: bool) -> Result<()> {
        Err(BridgeError::ReadOnlyAccessory(self.name().to_string()))
    }
}

/// Shared read path: refresh through the coalescer, then snapshot.
async fn refresh_and_read(
    platform: &Platform,
    index: usize,
    name: &str,
) -> Result<TrackedEntity> {
    if let Err(err) = platform.request_refresh().await {
        // Already reported once by the coalescer
        debug!("[Accessory] Refreshing accessories failed: {}", err);
    }
    let entity = stored(platform, index, name)?;
    debug!("[Accessory] {}: {:?}", name, entity.value);
    Ok(entity)
}

fn stored(platform: &Platform, index: usize, name: &str) -> Result<TrackedEntity> {
    platform
        .store()
        .entity(index)
        .ok_or_else(|| BridgeError::AccessoryNotFound(name.to_string()))
}

/// Temperature sensor accessory (pool, spa or air).
pub struct TemperatureAccessory {
    platform: Arc<Platform>,
    index: usize,
    kind: SensorKind,
    information: AccessoryInformation,
}

impl TemperatureAccessory {
    pub fn new(
        platform: Arc<Platform>,
        index: usize,
        kind: SensorKind,
        information: AccessoryInformation,
    ) -> Self {
        Self {
            platform,
            index,
            kind,
            information,
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }
}

#[async_trait]
impl AccessoryHandler for TemperatureAccessory {
    fn information(&self) -> &AccessoryInformation {
        &self.information
    }

    async fn read(&self) -> Result<TrackedEntity> {
        refresh_and_read(&self.platform, self.index, self.name()).await
    }

    fn cached(&self) -> Result<TrackedEntity> {
        stored(&self.platform, self.index, self.name())
    }
}

/// Circuit switch accessory.
pub struct CircuitAccessory {
    platform: Arc<Platform>,
    index: usize,
    circuit_id: CircuitId,
    information: AccessoryInformation,
}

impl CircuitAccessory {
    pub fn new(
        platform: Arc<Platform>,
        index: usize,
        circuit_id: CircuitId,
        information: AccessoryInformation,
    ) -> Self {
        Self {
            platform,
            index,
            circuit_id,
            information,
        }
    }

    pub fn circuit_id(&self) -> CircuitId {
        self.circuit_id
    }
}

#[async_trait]
impl AccessoryHandler for CircuitAccessory {
    fn information(&self) -> &AccessoryInformation {
        &self.information
    }

    async fn read(&self) -> Result<TrackedEntity> {
        refresh_and_read(&self.platform, self.index, self.name()).await
    }

    fn cached(&self) -> Result<TrackedEntity> {
        stored(&self.platform, self.index, self.name())
    }

    async fn write(&self, on: bool) -> Result<()> {
        info!(
            "[Circuit] {} ({}): switching {}",
            self.name(),
            self.circuit_id,
            if on { "on" } else { "off" }
        );
        self.platform.set_circuit_state(self.circuit_id, on).await
    }
}
