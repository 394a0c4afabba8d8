use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-form diagnostics attached to a reading by its source
pub type SourceMetadata = serde_json::Map<String, serde_json::Value>;

/// Origin of a reading
///
/// Serialized as the snake_case tag the ingestion endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingSource {
    Ttn,
    Ble,
    Simulator,
    ManualSensor,
    Api,
}

impl ReadingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingSource::Ttn => "ttn",
            ReadingSource::Ble => "ble",
            ReadingSource::Simulator => "simulator",
            ReadingSource::ManualSensor => "manual_sensor",
            ReadingSource::Api => "api",
        }
    }
}

impl fmt::Display for ReadingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical sensor observation accepted by the ingestion endpoint
///
/// `temperature` (degrees Fahrenheit) is the only required measurement, so a
/// value of this type is always ingestable. Ranges are not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReading {
    pub unit_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_serial: Option<String>,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door_open: Option<bool>,
    pub source: ReadingSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_metadata: Option<SourceMetadata>,
    /// ISO-8601; when absent the ingestion endpoint stamps the reading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,
}

impl NormalizedReading {
    /// Minimal reading with every optional field absent
    pub fn new(unit_id: impl Into<String>, temperature: f64, source: ReadingSource) -> Self {
        Self {
            unit_id: unit_id.into(),
            device_serial: None,
            temperature,
            humidity: None,
            battery_level: None,
            signal_strength: None,
            door_open: None,
            source,
            source_metadata: None,
            recorded_at: None,
        }
    }
}

/// Batch body sent to the ingestion endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IngestRequest {
    pub readings: Vec<NormalizedReading>,
}

impl IngestRequest {
    pub fn new(readings: Vec<NormalizedReading>) -> Self {
        Self { readings }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Outcome for one submitted reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOutcome {
    pub unit_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one ingestion call
///
/// `results` lines up positionally with the readings of the request that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    pub ingested: usize,
    pub failed: usize,
    pub results: Vec<UnitOutcome>,
}

/// Ways a response can disagree with the request it answers
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BatchMismatch {
    #[error("response has {actual} results for {expected} readings")]
    ResultCount { expected: usize, actual: usize },

    #[error("ingested ({ingested}) + failed ({failed}) does not equal {expected} readings")]
    Counts {
        expected: usize,
        ingested: usize,
        failed: usize,
    },

    #[error("result {index} is for unit '{actual}' but reading {index} is for unit '{expected}'")]
    OutOfOrder {
        index: usize,
        expected: String,
        actual: String,
    },
}

impl IngestResponse {
    /// Build a response from per-reading outcomes, deriving the counters
    pub fn from_outcomes(results: Vec<UnitOutcome>) -> Self {
        let ingested = results.iter().filter(|r| r.success).count();
        let failed = results.len() - ingested;
        Self {
            success: failed == 0,
            ingested,
            failed,
            results,
        }
    }

    /// Verify this response answers `request` item for item
    pub fn check_against(&self, request: &IngestRequest) -> Result<(), BatchMismatch> {
        let expected = request.len();

        if self.results.len() != expected {
            return Err(BatchMismatch::ResultCount {
                expected,
                actual: self.results.len(),
            });
        }

        if self.ingested.checked_add(self.failed) != Some(expected) {
            return Err(BatchMismatch::Counts {
                expected,
                ingested: self.ingested,
                failed: self.failed,
            });
        }

        for (index, (reading, outcome)) in request.readings.iter().zip(&self.results).enumerate() {
            if reading.unit_id != outcome.unit_id {
                return Err(BatchMismatch::OutOfOrder {
                    index,
                    expected: reading.unit_id.clone(),
                    actual: outcome.unit_id.clone(),
                });
            }
        }

        Ok(())
    }

    /// Pair each failed outcome with the reading that caused it
    pub fn failures<'a>(
        &'a self,
        request: &'a IngestRequest,
    ) -> impl Iterator<Item = (&'a NormalizedReading, &'a UnitOutcome)> + 'a {
        request
            .readings
            .iter()
            .zip(&self.results)
            .filter(|(_, outcome)| !outcome.success)
    }
}
