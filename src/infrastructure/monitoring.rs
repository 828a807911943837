use serde_json::Value;
use tracing::info;

use crate::{application::services::reporter::Reporter, domain::models::Message};

/// Emits every report as a structured `info` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, message: &Message, key: &str, value: Value) {
        info!(log_id = %message.log_id(), key, value = %value, "ace report");
    }
}
