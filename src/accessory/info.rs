//! Accessory information reported to the host (manufacturer, model, serial).

use crate::controller::DeviceConfig;
use serde::Serialize;
use uuid::Uuid;

pub const MANUFACTURER: &str = "Pentair";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessoryInformation {
    pub name: String,
    /// Stable across restarts: derived from device id and name
    pub uuid: Uuid,
    pub manufacturer: String,
    pub firmware_revision: String,
    /// Controller software version. It doesn't follow n.n.n, so it is
    /// reported as the model string rather than the firmware revision.
    pub model: String,
    pub serial_number: String,
}

impl AccessoryInformation {
    pub fn new(device: &DeviceConfig, name: impl Into<String>) -> Self {
        let name = name.into();
        let device_id = device.device_id();
        let uuid = Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("{}:{}", device_id, name).as_bytes(),
        );

        Self {
            name,
            uuid,
            manufacturer: MANUFACTURER.to_string(),
            firmware_revision: String::new(),
            model: device.software_version.clone(),
            serial_number: device_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(gateway_name: &str) -> DeviceConfig {
        DeviceConfig {
            gateway_name: gateway_name.to_string(),
            software_version: "POOL: 5.2 Build 736.0 Rel".to_string(),
            is_celsius: false,
            circuits: vec![],
        }
    }

    #[test]
    fn test_information_fields() {
        let info = AccessoryInformation::new(&device("Pentair: 12-34-56"), "Pool");
        assert_eq!(info.manufacturer, "Pentair");
        assert_eq!(info.firmware_revision, "");
        assert_eq!(info.model, "POOL: 5.2 Build 736.0 Rel");
        assert_eq!(info.serial_number, "12-34-56");
    }

    #[test]
    fn test_uuid_is_stable_and_distinct() {
        let a = AccessoryInformation::new(&device("Pentair: 12-34-56"), "Pool");
        let b = AccessoryInformation::new(&device("Pentair: 12-34-56"), "Pool");
        let c = AccessoryInformation::new(&device("Pentair: 12-34-56"), "Spa");
        let d = AccessoryInformation::new(&device("Pentair: 65-43-21"), "Pool");
        assert_eq!(a.uuid, b.uuid);
        assert_ne!(a.uuid, c.uuid);
        assert_ne!(a.uuid, d.uuid);
    }
}
