//! The Things Network (TTN v3) webhook uplinks and their conversion into
//! [`NormalizedReading`]s.

use serde::{Deserialize, Serialize};

use crate::reading::{NormalizedReading, ReadingSource, SourceMetadata};

/// Uplink message as posted by a TTN webhook integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtnUplinkPayload {
    pub end_device_ids: EndDeviceIds,
    pub uplink_message: UplinkMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndDeviceIds {
    pub device_id: String,
    pub dev_eui: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UplinkMessage {
    /// Output of the application payload formatter, absent when no formatter ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoded_payload: Option<DecodedPayload>,
    #[serde(default)]
    pub rx_metadata: Vec<RxMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<String>,
}

/// Fields our payload formatters emit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door_open: Option<bool>,
}

/// Per-gateway reception metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RxMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr: Option<f64>,
}

impl TtnUplinkPayload {
    pub fn dev_eui(&self) -> &str {
        &self.end_device_ids.dev_eui
    }

    pub fn device_id(&self) -> &str {
        &self.end_device_ids.device_id
    }

    /// Decoded temperature, if the formatter produced one
    pub fn temperature(&self) -> Option<f64> {
        self.uplink_message
            .decoded_payload
            .as_ref()
            .and_then(|p| p.temperature)
    }
}

/// Convert a TTN uplink into a reading for `unit_id`.
///
/// Returns `None` when the uplink carries no usable decoded temperature
/// (absent, zero or NaN); such uplinks are skipped rather than forwarded. Only the first gateway's RSSI
/// is used and `received_at` is passed through untouched.
pub fn transform(payload: &TtnUplinkPayload, unit_id: &str) -> Option<NormalizedReading> {
    let decoded = payload.uplink_message.decoded_payload.as_ref()?;
    let temperature = decoded.temperature.filter(|t| *t != 0.0 && !t.is_nan())?;

    let mut source_metadata = SourceMetadata::new();
    source_metadata.insert(
        "device_id".to_string(),
        payload.end_device_ids.device_id.clone().into(),
    );
    source_metadata.insert(
        "dev_eui".to_string(),
        payload.end_device_ids.dev_eui.clone().into(),
    );

    Some(NormalizedReading {
        unit_id: unit_id.to_string(),
        device_serial: Some(payload.end_device_ids.dev_eui.clone()),
        temperature,
        humidity: decoded.humidity,
        battery_level: decoded.battery,
        signal_strength: payload
            .uplink_message
            .rx_metadata
            .first()
            .and_then(|m| m.rssi),
        door_open: decoded.door_open,
        source: ReadingSource::Ttn,
        source_metadata: Some(source_metadata),
        recorded_at: payload.uplink_message.received_at.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uplink(decoded: Option<DecodedPayload>, rssi: &[f64]) -> TtnUplinkPayload {
        TtnUplinkPayload {
            end_device_ids: EndDeviceIds {
                device_id: "d1".to_string(),
                dev_eui: "AA:BB".to_string(),
            },
            uplink_message: UplinkMessage {
                decoded_payload: decoded,
                rx_metadata: rssi
                    .iter()
                    .map(|r| RxMetadata {
                        rssi: Some(*r),
                        snr: None,
                    })
                    .collect(),
                received_at: Some("2026-01-15T10:30:00.123456789Z".to_string()),
            },
        }
    }

    #[test]
    fn test_transform_full_reading() {
        let payload = uplink(
            Some(DecodedPayload {
                temperature: Some(34.5),
                humidity: Some(62.0),
                battery: None,
                door_open: Some(false),
            }),
            &[],
        );

        let reading = transform(&payload, "unit-123").unwrap();

        let expected = serde_json::json!({
            "unit_id": "unit-123",
            "device_serial": "AA:BB",
            "temperature": 34.5,
            "humidity": 62.0,
            "door_open": false,
            "source": "ttn",
            "source_metadata": {"device_id": "d1", "dev_eui": "AA:BB"},
            "recorded_at": "2026-01-15T10:30:00.123456789Z"
        });
        assert_eq!(serde_json::to_value(&reading).unwrap(), expected);
    }

    #[test]
    fn test_transform_copies_battery() {
        let payload = uplink(
            Some(DecodedPayload {
                temperature: Some(40.1),
                battery: Some(87.0),
                ..Default::default()
            }),
            &[],
        );

        let reading = transform(&payload, "u").unwrap();
        assert_eq!(reading.battery_level, Some(87.0));
        assert_eq!(reading.humidity, None);
        assert_eq!(reading.door_open, None);
    }

    #[test]
    fn test_transform_without_decoded_payload() {
        let payload = uplink(None, &[-80.0]);
        assert!(transform(&payload, "unit-123").is_none());
    }

    #[test]
    fn test_transform_without_temperature() {
        let payload = uplink(
            Some(DecodedPayload {
                humidity: Some(50.0),
                door_open: Some(true),
                ..Default::default()
            }),
            &[-80.0],
        );
        assert!(transform(&payload, "unit-123").is_none());
    }

    #[test]
    fn test_transform_skips_zero_temperature() {
        for temperature in [0.0, -0.0, f64::NAN] {
            let payload = uplink(
                Some(DecodedPayload {
                    temperature: Some(temperature),
                    humidity: Some(40.0),
                    ..Default::default()
                }),
                &[-90.0],
            );
            assert!(transform(&payload, "freezer-1").is_none());
        }
    }

    #[test]
    fn test_transform_keeps_sub_zero_temperature() {
        let payload = uplink(
            Some(DecodedPayload {
                temperature: Some(-0.5),
                ..Default::default()
            }),
            &[],
        );

        let reading = transform(&payload, "freezer-1").unwrap();
        assert_eq!(reading.temperature, -0.5);
    }

    #[test]
    fn test_transform_uses_first_gateway_rssi() {
        let payload = uplink(
            Some(DecodedPayload {
                temperature: Some(35.0),
                ..Default::default()
            }),
            &[-112.0, -70.0, -95.0],
        );

        let reading = transform(&payload, "u").unwrap();
        assert_eq!(reading.signal_strength, Some(-112.0));
    }

    #[test]
    fn test_transform_no_rx_metadata() {
        let payload = uplink(
            Some(DecodedPayload {
                temperature: Some(35.0),
                ..Default::default()
            }),
            &[],
        );

        let reading = transform(&payload, "u").unwrap();
        assert_eq!(reading.signal_strength, None);
    }

    #[test]
    fn test_deserialize_webhook_body() {
        let json = r#"{
            "end_device_ids": {
                "device_id": "walkin-sensor-01",
                "application_ids": {"application_id": "freshtrack"},
                "dev_eui": "0004A30B001C1234",
                "join_eui": "0000000000000000"
            },
            "received_at": "2026-01-15T10:30:01.000Z",
            "uplink_message": {
                "f_port": 1,
                "frm_payload": "AQIDBA==",
                "decoded_payload": {"temperature": 36.2, "humidity": 71.5, "battery": 90, "door_open": false},
                "rx_metadata": [
                    {"gateway_ids": {"gateway_id": "eui-00800000a00009ef"}, "rssi": -97, "snr": 7.25},
                    {"gateway_ids": {"gateway_id": "eui-00800000a00009f0"}, "rssi": -60, "snr": 9.5}
                ],
                "received_at": "2026-01-15T10:30:00.912Z"
            }
        }"#;

        let payload: TtnUplinkPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.dev_eui(), "0004A30B001C1234");
        assert_eq!(payload.device_id(), "walkin-sensor-01");
        assert_eq!(payload.temperature(), Some(36.2));

        let reading = transform(&payload, "unit-7").unwrap();
        assert_eq!(reading.signal_strength, Some(-97.0));
        assert_eq!(reading.battery_level, Some(90.0));
        assert_eq!(
            reading.recorded_at.as_deref(),
            Some("2026-01-15T10:30:00.912Z")
        );
    }

    #[test]
    fn test_deserialize_minimal_uplink() {
        let json = r#"{
            "end_device_ids": {"device_id": "d1", "dev_eui": "AA"},
            "uplink_message": {}
        }"#;

        let payload: TtnUplinkPayload = serde_json::from_str(json).unwrap();
        assert!(payload.uplink_message.rx_metadata.is_empty());
        assert_eq!(payload.temperature(), None);
        assert!(transform(&payload, "u").is_none());
    }

    #[test]
    fn test_null_temperature_is_absent() {
        let json = r#"{
            "end_device_ids": {"device_id": "d1", "dev_eui": "AA"},
            "uplink_message": {"decoded_payload": {"temperature": null, "humidity": 40}}
        }"#;

        let payload: TtnUplinkPayload = serde_json::from_str(json).unwrap();
        assert!(transform(&payload, "u").is_none());
    }
}
