use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::UpstreamError;
use freshtrack_ingest::{IngestRequest, IngestResponse};

/// Longest error body kept from a failed ingestion call
const MAX_ERROR_BODY_LEN: usize = 512;

/// Client for the downstream ingestion endpoint
#[derive(Debug, Clone)]
pub struct IngestClient {
    http: Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl IngestClient {
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.ingest_endpoint_url.clone(),
            auth_token: config.ingest_auth_token.clone(),
        })
    }

    /// Submit one batch and check the response lines up with it.
    ///
    /// No retries: a failed call is reported to the caller as-is.
    pub async fn submit(&self, request: &IngestRequest) -> Result<IngestResponse, UpstreamError> {
        debug!(endpoint = %self.endpoint, readings = request.len(), "Submitting ingest batch");

        let mut builder = self.http.post(&self.endpoint).json(request);
        if let Some(ref token) = self.auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_on_char_boundary(&mut body, MAX_ERROR_BODY_LEN);
            warn!(status = status.as_u16(), "Ingestion endpoint rejected batch");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let ingest_response: IngestResponse = serde_json::from_slice(&bytes)
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        ingest_response.check_against(request)?;

        Ok(ingest_response)
    }
}

fn truncate_on_char_boundary(text: &mut String, max_len: usize) {
    if text.len() <= max_len {
        return;
    }
    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}
