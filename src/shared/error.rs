use serde::{Deserialize, Serialize};

/// Error body returned by every webhook route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable error code (e.g., "INVALID_DEV_EUI", "UPSTREAM_ERROR")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Request ID for tracing and debugging
    pub request_id: String,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(
        error: impl Into<String>,
        message: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            request_id: request_id.into(),
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Common error codes used across the API
pub mod error_codes {
    // Authentication errors
    pub const MISSING_WEBHOOK_SECRET: &str = "MISSING_WEBHOOK_SECRET";
    pub const INVALID_WEBHOOK_SECRET: &str = "INVALID_WEBHOOK_SECRET";

    // Validation errors
    pub const INVALID_FORMAT: &str = "INVALID_FORMAT";
    pub const INVALID_DEV_EUI: &str = "INVALID_DEV_EUI";
    pub const INVALID_TIMESTAMP: &str = "INVALID_TIMESTAMP";
    pub const EMPTY_BATCH: &str = "EMPTY_BATCH";
    pub const BATCH_SIZE_EXCEEDED: &str = "BATCH_SIZE_EXCEEDED";

    // Routing
    pub const NOT_FOUND: &str = "NOT_FOUND";

    // Skip reasons (202 responses)
    pub const UNKNOWN_DEVICE: &str = "UNKNOWN_DEVICE";
    pub const NO_TEMPERATURE: &str = "NO_TEMPERATURE";

    // Database errors
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";

    // Ingestion endpoint errors
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";

    // Internal errors
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}
