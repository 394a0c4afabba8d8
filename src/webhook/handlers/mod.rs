pub mod readings;
pub mod uplink;

use lambda_http::{Body, Request, Response};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ValidationError};
use crate::router::json_response;
use freshtrack_ingest::IngestResponse;

/// Decode a JSON request body, rejecting empty bodies
pub fn parse_json_body<T: DeserializeOwned>(event: &Request) -> Result<T, ApiError> {
    let body_bytes = match event.body() {
        Body::Text(text) => text.as_bytes(),
        Body::Binary(bytes) => bytes.as_slice(),
        Body::Empty => {
            return Err(ValidationError::InvalidBody("Request body is empty".to_string()).into());
        }
    };

    serde_json::from_slice(body_bytes).map_err(|e| {
        ValidationError::InvalidBody(format!("Failed to parse JSON: {}", e)).into()
    })
}

/// 200 response carrying the ingestion endpoint's result
pub fn ingest_response(response: &IngestResponse) -> Result<Response<Body>, ApiError> {
    let body = serde_json::to_string(response)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize response: {}", e)))?;
    json_response(200, body)
}
