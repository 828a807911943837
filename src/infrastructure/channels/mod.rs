//! Concrete delivery channels and the provider response handling they share.

pub mod email;
pub mod file_email;
pub mod http_email;
pub mod http_push;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{StatusCode, header::HeaderMap};

use crate::domain::errors::DeliveryError;

/// Base delay before retrying after a rate limit or provider outage.
pub const NEXT_ATTEMPT_DELAY_SECONDS: f64 = 30.0;
/// Spread applied around [`NEXT_ATTEMPT_DELAY_SECONDS`] so that a burst of
/// throttled messages does not retry in lockstep.
pub const NEXT_ATTEMPT_JITTER_SECONDS: f64 = 2.0;

pub fn default_next_attempt(now: DateTime<Utc>) -> DateTime<Utc> {
    let jitter = (rand::random::<f64>() * 2.0 - 1.0) * NEXT_ATTEMPT_JITTER_SECONDS;
    let millis = ((NEXT_ATTEMPT_DELAY_SECONDS + jitter) * 1000.0).round() as i64;
    now + TimeDelta::milliseconds(millis)
}

/// Reads a `Retry-After` header given in seconds. Negative or unrepresentable
/// delays are ignored.
pub fn retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let seconds = headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let delay = TimeDelta::try_milliseconds((seconds * 1000.0).round() as i64)?;
    now.checked_add_signed(delay)
}

/// Maps a provider status to the delivery contract: 2xx delivered,
/// 429 and 5xx worth retrying, anything else permanent.
pub fn check_status(
    provider: &str,
    status: StatusCode,
    detail: &str,
    next_attempt_time: impl FnOnce() -> DateTime<Utc>,
) -> Result<(), DeliveryError> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Err(DeliveryError::recoverable(
            format!(
                "recoverable {provider} error (status_code={}): {detail}",
                status.as_u16()
            ),
            next_attempt_time(),
        ));
    }
    Err(DeliveryError::fatal(format!(
        "fatal {provider} error (status_code={}): {detail}",
        status.as_u16()
    )))
}

/// Pulls a human readable reason out of an error body, falling back to the
/// raw text.
pub fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(|detail| detail.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "Unknown error".to_string()
            } else {
                trimmed.to_string()
            }
        })
}
