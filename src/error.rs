use lambda_http::{Body, Response};
use thiserror::Error;

use freshtrack_ingest::shared::error::{error_codes, ErrorResponse};
use freshtrack_ingest::BatchMismatch;

/// Main error type for the TTN webhook service
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Ingestion endpoint error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Authentication-specific errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("X-Webhook-Secret header is missing")]
    MissingSecret,

    #[error("Webhook secret is invalid")]
    InvalidSecret,
}

/// Validation-specific errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid format for field: {0}")]
    InvalidFormat(String),

    #[error("DevEUI must be 16 hexadecimal digits")]
    InvalidDevEui,

    #[error("Timestamp must be RFC3339")]
    InvalidTimestamp,

    #[error("Batch contains no readings")]
    EmptyBatch,

    #[error("Batch size exceeds maximum of {0} readings")]
    BatchSizeExceeded(usize),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

/// Database-specific errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failures talking to the ingestion endpoint
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response could not be decoded: {0}")]
    Decode(String),

    #[error("response does not match request: {0}")]
    Misaligned(#[from] BatchMismatch),
}

impl From<freshtrack_ingest::ValidationError> for ValidationError {
    fn from(err: freshtrack_ingest::ValidationError) -> Self {
        match err.field.as_str() {
            "dev_eui" => ValidationError::InvalidDevEui,
            "recorded_at" => ValidationError::InvalidTimestamp,
            _ => ValidationError::InvalidFormat(format!("{}: {}", err.field, err.message)),
        }
    }
}

impl ApiError {
    /// Convert error to HTTP response with appropriate status code and error payload
    pub fn to_http_response(&self, request_id: &str) -> Response<Body> {
        let (status, error_code, message): (u16, &str, String) = match self {
            ApiError::Auth(AuthError::MissingSecret) => (
                401,
                error_codes::MISSING_WEBHOOK_SECRET,
                "X-Webhook-Secret header is required".to_string(),
            ),
            ApiError::Auth(AuthError::InvalidSecret) => (
                401,
                error_codes::INVALID_WEBHOOK_SECRET,
                "Webhook secret is invalid".to_string(),
            ),
            ApiError::Validation(err) => {
                let code = match err {
                    ValidationError::InvalidFormat(_) | ValidationError::InvalidBody(_) => {
                        error_codes::INVALID_FORMAT
                    }
                    ValidationError::InvalidDevEui => error_codes::INVALID_DEV_EUI,
                    ValidationError::InvalidTimestamp => error_codes::INVALID_TIMESTAMP,
                    ValidationError::EmptyBatch => error_codes::EMPTY_BATCH,
                    ValidationError::BatchSizeExceeded(_) => error_codes::BATCH_SIZE_EXCEEDED,
                };
                (400, code, err.to_string())
            }
            ApiError::Database(_) => (
                500,
                error_codes::DATABASE_ERROR,
                "Internal database error occurred".to_string(),
            ),
            ApiError::Upstream(err) => (
                502,
                error_codes::UPSTREAM_ERROR,
                format!("Ingestion endpoint error: {}", err),
            ),
            ApiError::Internal(_) => (
                500,
                error_codes::INTERNAL_ERROR,
                "Internal server error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse::new(error_code, &message, request_id);

        let body = error_response
            .to_json()
            .unwrap_or_else(|_| r#"{"error":"INTERNAL_ERROR","message":"Failed to serialize error response","request_id":""}"#.to_string());

        Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap_or_else(|_| {
                let mut fallback = Response::new(Body::from(
                    r#"{"error":"INTERNAL_ERROR","message":"Failed to build response"}"#,
                ));
                *fallback.status_mut() = lambda_http::http::StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

impl<E> From<aws_sdk_dynamodb::error::SdkError<E>> for DatabaseError
where
    E: std::fmt::Debug,
{
    fn from(err: aws_sdk_dynamodb::error::SdkError<E>) -> Self {
        DatabaseError::DynamoDb(format!("{:?}", err))
    }
}

impl From<serde_dynamo::Error> for DatabaseError {
    fn from(err: serde_dynamo::Error) -> Self {
        DatabaseError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_text(response: &Response<Body>) -> String {
        match response.body() {
            Body::Text(text) => text.clone(),
            _ => panic!("Expected text body"),
        }
    }

    #[test]
    fn test_auth_errors_are_401() {
        let response = ApiError::Auth(AuthError::MissingSecret).to_http_response("req-1");
        assert_eq!(response.status(), 401);
        assert!(body_text(&response).contains("MISSING_WEBHOOK_SECRET"));

        let response = ApiError::Auth(AuthError::InvalidSecret).to_http_response("req-2");
        assert_eq!(response.status(), 401);
        assert!(body_text(&response).contains("INVALID_WEBHOOK_SECRET"));
    }

    #[test]
    fn test_validation_error_codes() {
        let cases = [
            (ValidationError::InvalidDevEui, "INVALID_DEV_EUI"),
            (ValidationError::InvalidTimestamp, "INVALID_TIMESTAMP"),
            (ValidationError::EmptyBatch, "EMPTY_BATCH"),
            (ValidationError::BatchSizeExceeded(100), "BATCH_SIZE_EXCEEDED"),
            (
                ValidationError::InvalidBody("Request body is empty".to_string()),
                "INVALID_FORMAT",
            ),
        ];

        for (err, code) in cases {
            let response = ApiError::Validation(err).to_http_response("req-3");
            assert_eq!(response.status(), 400);
            let body = body_text(&response);
            assert!(body.contains(code), "{} missing from {}", code, body);
            assert!(body.contains("req-3"));
        }
    }

    #[test]
    fn test_upstream_errors_are_502() {
        let err = UpstreamError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        let response = ApiError::Upstream(err).to_http_response("req-4");
        assert_eq!(response.status(), 502);
        let body = body_text(&response);
        assert!(body.contains("UPSTREAM_ERROR"));
        assert!(body.contains("503"));
    }

    #[test]
    fn test_misaligned_response_is_upstream_error() {
        let err: ApiError = UpstreamError::from(BatchMismatch::ResultCount {
            expected: 2,
            actual: 1,
        })
        .into();
        assert_eq!(err.to_http_response("req-5").status(), 502);
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let response = ApiError::Database(DatabaseError::DynamoDb(
            "ResourceNotFoundException: sensors-prod".to_string(),
        ))
        .to_http_response("req-6");
        assert_eq!(response.status(), 500);
        assert!(!body_text(&response).contains("sensors-prod"));
    }

    #[test]
    fn test_library_validation_error_mapping() {
        let err: ValidationError =
            freshtrack_ingest::ValidationError::new("dev_eui", "bad").into();
        assert!(matches!(err, ValidationError::InvalidDevEui));

        let err: ValidationError =
            freshtrack_ingest::ValidationError::new("recorded_at", "bad").into();
        assert!(matches!(err, ValidationError::InvalidTimestamp));

        let err: ValidationError =
            freshtrack_ingest::ValidationError::new("unit_id", "Unit ID cannot be empty").into();
        assert!(err.to_string().contains("unit_id: Unit ID cannot be empty"));
    }
}
