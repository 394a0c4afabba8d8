use serde::{Deserialize, Serialize};

use crate::battery::BatteryInfo;

/// Sensor registry entry linking a LoRaWAN device to the unit it monitors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredSensor {
    /// Normalized DevEUI (16 uppercase hex digits), the registry key
    pub dev_eui: String,
    /// Storage unit readings are attributed to
    pub unit_id: String,
    /// TTN end-device id, when recorded at provisioning time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_info: Option<BatteryInfo>,
}
