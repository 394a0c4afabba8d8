use lambda_http::Request;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Header TTN webhook integrations and internal producers send the shared secret in
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Hex-encoded SHA-256 of a webhook secret
///
/// Only the digest is configured on the function, so the secret itself never
/// sits in the Lambda environment.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check the X-Webhook-Secret header against the configured digest
///
/// # Returns
/// * `Ok(())` - Secret matches
/// * `Err(AuthError::MissingSecret)` - Header absent, empty or not UTF-8
/// * `Err(AuthError::InvalidSecret)` - Secret does not match
pub fn validate_webhook_secret(event: &Request, expected_hash: &str) -> Result<(), AuthError> {
    let secret = event
        .headers()
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(AuthError::MissingSecret)?;

    let presented = hash_secret(secret);
    if !constant_time_compare(&presented, &expected_hash.to_ascii_lowercase()) {
        return Err(AuthError::InvalidSecret);
    }

    Ok(())
}

/// Compare all bytes regardless of where the first difference is
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    if a_bytes.len() != b_bytes.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a_bytes.iter().zip(b_bytes.iter()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}
