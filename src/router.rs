use lambda_http::http::Method;
use lambda_http::{Body, Request, Response};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::handlers::readings::handle_readings;
use crate::handlers::uplink::handle_uplink;
use crate::ingest_client::IngestClient;
use freshtrack_ingest::shared::error::{error_codes, ErrorResponse};

/// Route a health check request (no config needed)
pub fn route_request_health(request_id: &str) -> Result<Response<Body>, ApiError> {
    handle_health(request_id)
}

/// Route an incoming request to the appropriate handler
///
/// Paths are normalized (trailing slashes dropped) and matched on
/// (method, path). Unknown routes return 404.
pub async fn route_request(
    event: Request,
    request_id: &str,
    config: &Config,
    ingest_client: &IngestClient,
) -> Result<Response<Body>, ApiError> {
    let method = event.method().clone();
    let path = normalize_path(event.uri().path());

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Routing request"
    );

    match (&method, path.as_str()) {
        (&Method::GET, "/health") => handle_health(request_id),

        (&Method::POST, "/ttn/uplink") => {
            handle_uplink(event, request_id, config, ingest_client).await
        }

        (&Method::POST, "/readings") => {
            handle_readings(event, request_id, config, ingest_client).await
        }

        _ => {
            warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                "Unknown route"
            );
            handle_not_found(request_id, &method, &path)
        }
    }
}

/// Normalize a path by removing trailing slashes
///
/// The root path "/" is preserved as-is.
pub fn normalize_path(path: &str) -> String {
    if path == "/" {
        return path.to_string();
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build a JSON response with the given status
pub fn json_response(status: u16, body: String) -> Result<Response<Body>, ApiError> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

fn handle_health(request_id: &str) -> Result<Response<Body>, ApiError> {
    let body = serde_json::json!({
        "status": "healthy",
        "service": "ttn-webhook",
        "request_id": request_id
    });

    json_response(200, body.to_string())
}

fn handle_not_found(
    request_id: &str,
    method: &Method,
    path: &str,
) -> Result<Response<Body>, ApiError> {
    let message = format!("Route {} {} not found", method, path);
    let body = ErrorResponse::new(error_codes::NOT_FOUND, &message, request_id)
        .to_json()
        .map_err(|e| ApiError::Internal(format!("Failed to serialize response: {}", e)))?;

    json_response(404, body)
}
