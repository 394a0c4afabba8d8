use lambda_http::{Body, Request, Response};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ApiError, ValidationError};
use crate::ingest_client::IngestClient;
use crate::router::json_response;
use freshtrack_ingest::shared::error::error_codes;
use freshtrack_ingest::{
    normalize_dev_eui, resolve_chemistry, transform, IngestRequest, RegisteredSensor,
    TtnUplinkPayload,
};

use super::{ingest_response, parse_json_body};

/// Handle POST /ttn/uplink requests from the TTN webhook integration
///
/// Authenticates the shared secret, looks the device up in the sensor
/// registry and forwards its reading as a one-reading batch. Uplinks from
/// unregistered devices or without a decoded temperature are acknowledged
/// with 202 and dropped, so TTN does not retry them.
pub async fn handle_uplink(
    event: Request,
    request_id: &str,
    config: &Config,
    ingest_client: &IngestClient,
) -> Result<Response<Body>, ApiError> {
    crate::auth::validate_webhook_secret(&event, &config.webhook_secret_hash)?;

    let payload: TtnUplinkPayload = parse_json_body(&event)?;
    let dev_eui = normalize_dev_eui(payload.dev_eui()).map_err(ValidationError::from)?;

    let sensor = crate::repo::sensors::get_sensor_by_dev_eui(
        &config.dynamodb_client,
        &config.sensors_table,
        &dev_eui,
    )
    .await?;

    forward_uplink(&payload, &dev_eui, sensor, request_id, ingest_client).await
}

/// Transform and submit an uplink once the registry lookup is done
pub async fn forward_uplink(
    payload: &TtnUplinkPayload,
    dev_eui: &str,
    sensor: Option<RegisteredSensor>,
    request_id: &str,
    ingest_client: &IngestClient,
) -> Result<Response<Body>, ApiError> {
    let Some(sensor) = sensor else {
        warn!(
            request_id = %request_id,
            dev_eui = %dev_eui,
            device_id = %payload.device_id(),
            "Uplink from unregistered device"
        );
        return skipped(request_id, error_codes::UNKNOWN_DEVICE);
    };

    match resolve_chemistry(sensor.battery_info.as_ref()) {
        Some(chemistry) => info!(
            request_id = %request_id,
            dev_eui = %dev_eui,
            chemistry = chemistry.catalog_key(),
            "Resolved battery chemistry"
        ),
        None => info!(
            request_id = %request_id,
            dev_eui = %dev_eui,
            "No battery chemistry on record"
        ),
    }

    let Some(reading) = transform(payload, &sensor.unit_id) else {
        info!(
            request_id = %request_id,
            dev_eui = %dev_eui,
            unit_id = %sensor.unit_id,
            "Uplink has no usable decoded temperature"
        );
        return skipped(request_id, error_codes::NO_TEMPERATURE);
    };

    let batch = IngestRequest::new(vec![reading]);
    let response = ingest_client.submit(&batch).await?;

    info!(
        request_id = %request_id,
        dev_eui = %dev_eui,
        unit_id = %sensor.unit_id,
        ingested = response.ingested,
        failed = response.failed,
        "Uplink forwarded"
    );

    ingest_response(&response)
}

fn skipped(request_id: &str, reason: &str) -> Result<Response<Body>, ApiError> {
    let body = serde_json::json!({
        "status": "skipped",
        "reason": reason,
        "request_id": request_id
    });

    json_response(202, body.to_string())
}
