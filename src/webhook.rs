// TTN webhook binary entry point

mod auth;
mod config;
mod error;
mod ingest_client;
mod repo;
mod router;

#[path = "webhook/handlers/mod.rs"]
mod handlers;

use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use tracing::{error, info};

use config::{Config, ConfigError};
use error::ApiError;
use ingest_client::IngestClient;
use router::route_request;

async fn function_handler(event: Request) -> Result<Response<Body>, Error> {
    let request_id = event.lambda_context().request_id.clone();

    info!(
        request_id = %request_id,
        method = %event.method(),
        path = %event.uri().path(),
        "TTN webhook Lambda invoked"
    );

    // Health checks answer without configuration
    if event.method() == lambda_http::http::Method::GET
        && router::normalize_path(event.uri().path()) == "/health"
    {
        return match router::route_request_health(&request_id) {
            Ok(response) => Ok(response),
            Err(api_error) => {
                error!(
                    request_id = %request_id,
                    error = %api_error,
                    "Health check failed"
                );
                Ok(api_error.to_http_response(&request_id))
            }
        };
    }

    let config = match Config::from_env().await {
        Ok(config) => config,
        Err(e) => {
            error!(
                request_id = %request_id,
                error = %e,
                "Failed to load configuration"
            );
            return Ok(config_error_response(&e, &request_id));
        }
    };

    let ingest_client = match IngestClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!(
                request_id = %request_id,
                error = %e,
                "Failed to build ingestion client"
            );
            return Ok(ApiError::Internal(format!("Client error: {}", e))
                .to_http_response(&request_id));
        }
    };

    Ok(dispatch(event, &request_id, &config, &ingest_client).await)
}

/// 500 for a misconfigured function; the variable name stays in the logs
fn config_error_response(err: &ConfigError, request_id: &str) -> Response<Body> {
    ApiError::Internal(format!("Configuration error: {}", err)).to_http_response(request_id)
}

/// Route a configured request and turn any error into its HTTP response
async fn dispatch(
    event: Request,
    request_id: &str,
    config: &Config,
    ingest_client: &IngestClient,
) -> Response<Body> {
    match route_request(event, request_id, config, ingest_client).await {
        Ok(response) => {
            info!(
                request_id = %request_id,
                status = %response.status(),
                "Request completed"
            );
            response
        }
        Err(api_error) => {
            match &api_error {
                ApiError::Upstream(_) | ApiError::Database(_) | ApiError::Internal(_) => error!(
                    request_id = %request_id,
                    error = %api_error,
                    "Request failed"
                ),
                ApiError::Auth(_) | ApiError::Validation(_) => info!(
                    request_id = %request_id,
                    error = %api_error,
                    "Request rejected"
                ),
            }
            api_error.to_http_response(request_id)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    info!("TTN webhook Lambda starting");

    run(service_fn(function_handler)).await
}
