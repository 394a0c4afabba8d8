//! Test utilities for property-based testing
//!
//! Generators for DevEUIs, unit ids, TTN uplinks and ingest batches used by
//! the proptest suites under `tests/`.

pub mod generators {
    use proptest::prelude::*;

    use crate::reading::{
        IngestRequest, IngestResponse, NormalizedReading, ReadingSource, UnitOutcome,
    };
    use crate::ttn::{DecodedPayload, EndDeviceIds, RxMetadata, TtnUplinkPayload, UplinkMessage};

    /// Generate a DevEUI in registry key form (16 uppercase hex digits)
    pub fn dev_eui() -> impl Strategy<Value = String> {
        prop::collection::vec(any::<u8>(), 8).prop_map(|bytes| {
            bytes.iter().map(|b| format!("{:02X}", b)).collect::<String>()
        })
    }

    /// Generate a DevEUI as humans type it: mixed case, optional separators
    pub fn loose_dev_eui() -> impl Strategy<Value = (String, String)> {
        (
            prop::collection::vec(any::<u8>(), 8),
            prop_oneof![Just(""), Just(":"), Just("-")],
            any::<bool>(),
        )
            .prop_map(|(bytes, separator, lowercase)| {
                let canonical: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                let typed = bytes
                    .iter()
                    .map(|b| {
                        if lowercase {
                            format!("{:02x}", b)
                        } else {
                            format!("{:02X}", b)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(separator);
                (typed, canonical)
            })
    }

    /// Generate an invalid DevEUI
    pub fn invalid_dev_eui() -> impl Strategy<Value = String> {
        prop_oneof![
            // Too short
            Just("0004A30B001C12".to_string()),
            // Too long
            Just("0004A30B001C123456".to_string()),
            // Invalid characters
            Just("0004A30B001C12ZZ".to_string()),
            // Wrong separator
            Just("00_04_A3_0B_00_1C_12_34".to_string()),
            // Empty
            Just("".to_string()),
            // Random short hex
            prop::string::string_regex("[0-9A-F]{1,15}").expect("Valid regex"),
        ]
    }

    /// Generate a valid unit identifier
    pub fn unit_id() -> impl Strategy<Value = String> {
        prop::string::string_regex("[A-Za-z0-9_-]{1,64}").expect("Valid regex for unit_id")
    }

    /// Generate a temperature in degrees Fahrenheit, freezers to ambient
    pub fn temperature_f() -> impl Strategy<Value = f64> {
        -40.0f64..120.0f64
    }

    /// Generate a temperature the TTN transform accepts (non-zero)
    pub fn usable_temperature_f() -> impl Strategy<Value = f64> {
        temperature_f().prop_filter("zero temperatures are not forwarded", |t| *t != 0.0)
    }

    pub fn source() -> impl Strategy<Value = ReadingSource> {
        prop_oneof![
            Just(ReadingSource::Ttn),
            Just(ReadingSource::Ble),
            Just(ReadingSource::Simulator),
            Just(ReadingSource::ManualSensor),
            Just(ReadingSource::Api),
        ]
    }

    /// Generate a decoded payload that always carries a usable temperature
    pub fn decoded_payload() -> impl Strategy<Value = DecodedPayload> {
        (
            usable_temperature_f(),
            proptest::option::of(0.0f64..100.0),
            proptest::option::of(0.0f64..100.0),
            proptest::option::of(any::<bool>()),
        )
            .prop_map(|(temperature, humidity, battery, door_open)| DecodedPayload {
                temperature: Some(temperature),
                humidity,
                battery,
                door_open,
            })
    }

    /// Generate a decoded payload without a usable temperature (absent or zero)
    pub fn decoded_payload_without_temperature() -> impl Strategy<Value = DecodedPayload> {
        (
            prop_oneof![Just(None), Just(Some(0.0f64))],
            proptest::option::of(0.0f64..100.0),
            proptest::option::of(any::<bool>()),
        )
            .prop_map(|(temperature, humidity, door_open)| DecodedPayload {
                temperature,
                humidity,
                battery: None,
                door_open,
            })
    }

    /// Generate radio metadata for zero to four receiving gateways
    pub fn rx_metadata() -> impl Strategy<Value = Vec<RxMetadata>> {
        prop::collection::vec(
            (-130.0f64..-30.0, proptest::option::of(-20.0f64..15.0))
                .prop_map(|(rssi, snr)| RxMetadata {
                    rssi: Some(rssi),
                    snr,
                }),
            0..4,
        )
    }

    /// Generate a TTN uplink around the given decoded payload strategy
    pub fn ttn_uplink(
        decoded: impl Strategy<Value = Option<DecodedPayload>>,
    ) -> impl Strategy<Value = TtnUplinkPayload> {
        (
            prop::string::string_regex("[a-z0-9-]{1,36}").expect("Valid regex for device_id"),
            dev_eui(),
            decoded,
            rx_metadata(),
            proptest::option::of(Just("2026-01-15T10:30:00.912Z".to_string())),
        )
            .prop_map(
                |(device_id, dev_eui, decoded_payload, rx_metadata, received_at)| {
                    TtnUplinkPayload {
                        end_device_ids: EndDeviceIds { device_id, dev_eui },
                        uplink_message: UplinkMessage {
                            decoded_payload,
                            rx_metadata,
                            received_at,
                        },
                    }
                },
            )
    }

    /// Generate a caller-supplied normalized reading
    pub fn normalized_reading() -> impl Strategy<Value = NormalizedReading> {
        (unit_id(), temperature_f(), source()).prop_map(|(unit_id, temperature, source)| {
            NormalizedReading::new(unit_id, temperature, source)
        })
    }

    /// Generate a batch of up to `max` readings
    pub fn ingest_request(max: usize) -> impl Strategy<Value = IngestRequest> {
        prop::collection::vec(normalized_reading(), 0..=max).prop_map(IngestRequest::new)
    }

    /// Answer a request item for item, failing the readings marked in `fail`
    pub fn response_for(request: &IngestRequest, fail: &[bool]) -> IngestResponse {
        let outcomes = request
            .readings
            .iter()
            .enumerate()
            .map(|(i, reading)| {
                let failed = fail.get(i).copied().unwrap_or(false);
                UnitOutcome {
                    unit_id: reading.unit_id.clone(),
                    success: !failed,
                    error: failed.then(|| "rejected".to_string()),
                }
            })
            .collect();
        IngestResponse::from_outcomes(outcomes)
    }
}

/// Builders for fixed fixtures used in unit and handler tests
pub mod fixtures {
    use crate::ttn::TtnUplinkPayload;

    /// Webhook body for a walk-in cooler sensor
    pub const WALKIN_UPLINK_JSON: &str = r#"{
        "end_device_ids": {
            "device_id": "walkin-sensor-01",
            "application_ids": {"application_id": "freshtrack"},
            "dev_eui": "0004A30B001C1234"
        },
        "uplink_message": {
            "decoded_payload": {"temperature": 36.2, "humidity": 71.5, "battery": 90, "door_open": false},
            "rx_metadata": [{"rssi": -97, "snr": 7.25}],
            "received_at": "2026-01-15T10:30:00.912Z"
        }
    }"#;

    pub fn walkin_uplink() -> TtnUplinkPayload {
        serde_json::from_str(WALKIN_UPLINK_JSON).expect("fixture is valid JSON")
    }
}
