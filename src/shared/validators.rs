use regex::Regex;
use std::sync::OnceLock;

use crate::reading::NormalizedReading;

/// Maximum readings accepted in one ingest batch
pub const MAX_BATCH_SIZE: usize = 100;

/// Maximum length of a unit identifier
pub const MAX_UNIT_ID_LEN: usize = 128;

/// Validation error type
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Validation error for field '{}': {}",
            self.field, self.message
        )
    }
}

impl std::error::Error for ValidationError {}

fn eui64_regex() -> &'static Regex {
    static EUI64_REGEX: OnceLock<Regex> = OnceLock::new();
    EUI64_REGEX.get_or_init(|| Regex::new(r"^[0-9A-F]{16}$").unwrap())
}

/// Normalize an EUI-64 (DevEUI, gateway EUI) to 16 uppercase hex digits
///
/// Accepts `:`/`-` separated or bare forms in any case.
pub fn normalize_eui64(value: &str, field: &str) -> Result<String, ValidationError> {
    let normalized: String = value
        .chars()
        .filter(|c| !matches!(c, ':' | '-') && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if eui64_regex().is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(ValidationError::new(
            field,
            "EUI must be 16 hexadecimal digits (e.g. 0004A30B001C1234)",
        ))
    }
}

/// Normalize a LoRaWAN DevEUI to the registry key form
pub fn normalize_dev_eui(dev_eui: &str) -> Result<String, ValidationError> {
    normalize_eui64(dev_eui, "dev_eui")
}

/// Validate a DevEUI already in registry key form (16 uppercase hex digits)
pub fn validate_dev_eui(dev_eui: &str) -> Result<(), ValidationError> {
    if eui64_regex().is_match(dev_eui) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "dev_eui",
            "DevEUI must be 16 uppercase hexadecimal digits",
        ))
    }
}

/// Validate a unit identifier
/// Unit IDs are opaque, max 128 chars, safe ASCII only
pub fn validate_unit_id(unit_id: &str) -> Result<(), ValidationError> {
    if unit_id.is_empty() {
        return Err(ValidationError::new("unit_id", "Unit ID cannot be empty"));
    }

    if unit_id.len() > MAX_UNIT_ID_LEN {
        return Err(ValidationError::new(
            "unit_id",
            format!(
                "Unit ID length {} exceeds maximum of {} characters",
                unit_id.len(),
                MAX_UNIT_ID_LEN
            ),
        ));
    }

    if !unit_id
        .chars()
        .all(|c| c.is_ascii() && (' '..='~').contains(&c))
    {
        return Err(ValidationError::new(
            "unit_id",
            "Unit ID must contain only safe ASCII characters (printable ASCII 0x20-0x7E)",
        ));
    }

    Ok(())
}

/// Validate RFC3339 timestamp string
pub fn validate_rfc3339_timestamp(timestamp: &str) -> Result<(), ValidationError> {
    match chrono::DateTime::parse_from_rfc3339(timestamp) {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::new(
            "recorded_at",
            "Timestamp must be in RFC3339 format (e.g., 2024-01-15T10:30:00Z)",
        )),
    }
}

/// Validate a UUID of any version (organization and site ids)
pub fn validate_uuid(value: &str, field: &str) -> Result<(), ValidationError> {
    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new(field, "Invalid UUID format"))
}

/// Validate the identifying fields of a caller-supplied reading
///
/// Measurement ranges are left to the ingestion endpoint.
pub fn validate_reading(reading: &NormalizedReading) -> Result<(), ValidationError> {
    validate_unit_id(&reading.unit_id)?;

    if let Some(ref recorded_at) = reading.recorded_at {
        validate_rfc3339_timestamp(recorded_at)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::ReadingSource;

    #[test]
    fn test_normalize_dev_eui() {
        // Accepted forms
        assert_eq!(
            normalize_dev_eui("0004A30B001C1234").unwrap(),
            "0004A30B001C1234"
        );
        assert_eq!(
            normalize_dev_eui("00:04:a3:0b:00:1c:12:34").unwrap(),
            "0004A30B001C1234"
        );
        assert_eq!(
            normalize_dev_eui("00-04-A3-0B-00-1C-12-34").unwrap(),
            "0004A30B001C1234"
        );
        assert_eq!(
            normalize_dev_eui(" 0004 a30b 001c 1234 ").unwrap(),
            "0004A30B001C1234"
        );

        // Rejected forms
        assert!(normalize_dev_eui("").is_err());
        assert!(normalize_dev_eui("AA:BB").is_err()); // too short
        assert!(normalize_dev_eui("0004A30B001C123456").is_err()); // too long
        assert!(normalize_dev_eui("0004A30B001C12ZZ").is_err()); // invalid hex
    }

    #[test]
    fn test_normalize_eui64_field_name() {
        let err = normalize_eui64("nope", "gateway_eui").unwrap_err();
        assert_eq!(err.field, "gateway_eui");
    }

    #[test]
    fn test_validate_dev_eui() {
        assert!(validate_dev_eui("0004A30B001C1234").is_ok());
        assert!(validate_dev_eui("0004a30b001c1234").is_err()); // lowercase
        assert!(validate_dev_eui("00:04:A3:0B:00:1C:12:34").is_err()); // separators
    }

    #[test]
    fn test_validate_unit_id() {
        assert!(validate_unit_id("unit-123").is_ok());
        assert!(validate_unit_id("7c9e6679-7425-40de-944b-e07fc1f90ae7").is_ok());
        assert!(validate_unit_id(&"a".repeat(128)).is_ok()); // exactly 128 chars

        assert!(validate_unit_id("").is_err());
        assert!(validate_unit_id(&"a".repeat(129)).is_err());
        assert!(validate_unit_id("unit\nid").is_err());
        assert!(validate_unit_id("unité").is_err());
    }

    #[test]
    fn test_validate_rfc3339_timestamp() {
        assert!(validate_rfc3339_timestamp("2024-01-15T10:30:00Z").is_ok());
        assert!(validate_rfc3339_timestamp("2024-01-15T10:30:00+00:00").is_ok());
        assert!(validate_rfc3339_timestamp("2024-01-15T10:30:00.123456789Z").is_ok());

        assert!(validate_rfc3339_timestamp("2024-01-15").is_err());
        assert!(validate_rfc3339_timestamp("not-a-timestamp").is_err());
        assert!(validate_rfc3339_timestamp("").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000", "organization_id").is_ok());
        assert!(validate_uuid("550e8400-e29b-11d4-a716-446655440000", "site_id").is_ok());

        let err = validate_uuid("my-org-123", "organization_id").unwrap_err();
        assert_eq!(err.field, "organization_id");
    }

    #[test]
    fn test_validate_reading() {
        let mut reading = NormalizedReading::new("unit-1", 38.2, ReadingSource::Api);
        assert!(validate_reading(&reading).is_ok());

        // Out-of-range measurements are not this layer's concern
        reading.humidity = Some(140.0);
        reading.battery_level = Some(-5.0);
        assert!(validate_reading(&reading).is_ok());

        reading.recorded_at = Some("2026-01-15T10:30:00Z".to_string());
        assert!(validate_reading(&reading).is_ok());

        reading.recorded_at = Some("yesterday".to_string());
        assert_eq!(validate_reading(&reading).unwrap_err().field, "recorded_at");

        reading.unit_id = String::new();
        assert_eq!(validate_reading(&reading).unwrap_err().field, "unit_id");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("unit_id", "Unit ID cannot be empty");
        assert_eq!(
            err.to_string(),
            "Validation error for field 'unit_id': Unit ID cannot be empty"
        );
    }
}
