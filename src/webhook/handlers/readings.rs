use lambda_http::{Body, Request, Response};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ApiError, ValidationError};
use crate::ingest_client::IngestClient;
use freshtrack_ingest::{validate_reading, IngestRequest, MAX_BATCH_SIZE};

use super::{ingest_response, parse_json_body};

/// Handle POST /readings requests carrying already-normalized readings
///
/// Batches are validated whole before anything is forwarded: one bad
/// reading rejects the batch.
pub async fn handle_readings(
    event: Request,
    request_id: &str,
    config: &Config,
    ingest_client: &IngestClient,
) -> Result<Response<Body>, ApiError> {
    crate::auth::validate_webhook_secret(&event, &config.webhook_secret_hash)?;

    let request: IngestRequest = parse_json_body(&event)?;
    validate_batch(&request)?;

    let response = ingest_client.submit(&request).await?;

    if response.failed > 0 {
        for (reading, outcome) in response.failures(&request) {
            warn!(
                request_id = %request_id,
                unit_id = %reading.unit_id,
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "Reading rejected by ingestion endpoint"
            );
        }
    }

    info!(
        request_id = %request_id,
        readings = request.len(),
        ingested = response.ingested,
        failed = response.failed,
        "Batch forwarded"
    );

    ingest_response(&response)
}

/// Check batch bounds, then every reading in order
pub fn validate_batch(request: &IngestRequest) -> Result<(), ValidationError> {
    if request.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }
    if request.len() > MAX_BATCH_SIZE {
        return Err(ValidationError::BatchSizeExceeded(MAX_BATCH_SIZE));
    }

    for reading in &request.readings {
        validate_reading(reading)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest_client::test_server::one_shot_server;
    use freshtrack_ingest::{NormalizedReading, ReadingSource};
    use lambda_http::http::Method;

    const SECRET: &str = "producer-secret";

    fn test_config(ingest_url: &str) -> Config {
        Config::for_test(
            "http://127.0.0.1:9",
            "sensors".to_string(),
            ingest_url.to_string(),
            crate::auth::hash_secret(SECRET),
        )
    }

    fn readings_request(body: &IngestRequest) -> Request {
        Request::from(
            lambda_http::http::Request::builder()
                .method(Method::POST)
                .uri("/readings")
                .header("X-Webhook-Secret", SECRET)
                .body(Body::from(serde_json::to_string(body).unwrap()))
                .unwrap(),
        )
    }

    fn reading(unit_id: &str) -> NormalizedReading {
        NormalizedReading::new(unit_id, 38.5, ReadingSource::Simulator)
    }

    #[test]
    fn test_validate_batch_bounds() {
        assert!(matches!(
            validate_batch(&IngestRequest::default()),
            Err(ValidationError::EmptyBatch)
        ));

        let full = IngestRequest::new((0..MAX_BATCH_SIZE).map(|i| reading(&format!("unit-{}", i))).collect());
        assert!(validate_batch(&full).is_ok());

        let over = IngestRequest::new(
            (0..=MAX_BATCH_SIZE)
                .map(|i| reading(&format!("unit-{}", i)))
                .collect(),
        );
        assert!(matches!(
            validate_batch(&over),
            Err(ValidationError::BatchSizeExceeded(100))
        ));
    }

    #[test]
    fn test_validate_batch_rejects_bad_reading() {
        let mut bad_time = reading("unit-2");
        bad_time.recorded_at = Some("yesterday".to_string());
        let request = IngestRequest::new(vec![reading("unit-1"), bad_time]);
        assert!(matches!(
            validate_batch(&request),
            Err(ValidationError::InvalidTimestamp)
        ));

        let request = IngestRequest::new(vec![reading("")]);
        assert!(matches!(
            validate_batch(&request),
            Err(ValidationError::InvalidFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_batch_not_forwarded() {
        // Nothing listens here, so reaching the client would be an Upstream error
        let config = test_config("http://127.0.0.1:9/ingest");
        let client = IngestClient::new(&config).unwrap();

        let result = handle_readings(
            readings_request(&IngestRequest::default()),
            "req-1",
            &config,
            &client,
        )
        .await;
        assert!(matches!(
            result,
            Err(ApiError::Validation(ValidationError::EmptyBatch))
        ));
    }

    #[tokio::test]
    async fn test_batch_forwarded_with_partial_failure() {
        let upstream = serde_json::json!({
            "success": false,
            "ingested": 1,
            "failed": 1,
            "results": [
                {"unit_id": "unit-1", "success": true},
                {"unit_id": "unit-missing", "success": false, "error": "Unit not found"}
            ]
        })
        .to_string();
        let (url, _server) = one_shot_server("HTTP/1.1 200 OK", upstream).await;
        let config = test_config(&url);
        let client = IngestClient::new(&config).unwrap();

        let batch = IngestRequest::new(vec![reading("unit-1"), reading("unit-missing")]);
        let response = handle_readings(readings_request(&batch), "req-2", &config, &client)
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = match response.body() {
            Body::Text(text) => serde_json::from_str(text).unwrap(),
            _ => panic!("Expected text body"),
        };
        assert_eq!(body["success"], false);
        assert_eq!(body["failed"], 1);
        assert_eq!(body["results"][1]["error"], "Unit not found");
    }
}
