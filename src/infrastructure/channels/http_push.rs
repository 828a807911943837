//! Push notifications through an HTTP push gateway keyed by user id.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{
    check_status, default_next_attempt, email::compress_whitespace, error_detail, retry_after,
};
use crate::{
    application::services::{channel::Channel, clock::Clock},
    domain::{
        errors::DeliveryError,
        models::{ChannelType, Message, RenderedContent},
    },
};

pub const HTTP_PUSH_CHANNEL: &str = "http_push";
/// Context key whose object is forwarded to the gateway as extra data.
pub const PUSH_EXTRA_CONTEXT_KEY: &str = "push_notification_extra_context";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default)]
pub struct HttpPushSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

pub struct HttpPushChannel {
    settings: HttpPushSettings,
    client: Client,
    clock: Arc<dyn Clock>,
}

impl HttpPushChannel {
    pub fn new(settings: HttpPushSettings, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("ace-router/http-push")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build the push gateway client")?;
        Ok(Self {
            settings,
            client,
            clock,
        })
    }

    fn configured(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|value| !value.is_empty())
    }
}

#[async_trait]
impl Channel for HttpPushChannel {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Push
    }

    fn name(&self) -> &str {
        HTTP_PUSH_CHANNEL
    }

    fn enabled(&self) -> bool {
        let mut ok = true;
        for (setting, value) in [
            ("ACE_PUSH_ENDPOINT", &self.settings.endpoint),
            ("ACE_PUSH_API_KEY", &self.settings.api_key),
        ] {
            if Self::configured(value).is_none() {
                warn!("{setting} is not set, {HTTP_PUSH_CHANNEL} channel is disabled");
                ok = false;
            }
        }
        ok
    }

    async fn deliver(
        &self,
        message: &Message,
        rendered: &RenderedContent,
    ) -> Result<(), DeliveryError> {
        let (Some(endpoint), Some(api_key)) = (
            Self::configured(&self.settings.endpoint),
            Self::configured(&self.settings.api_key),
        ) else {
            return Err(DeliveryError::fatal(format!(
                "{HTTP_PUSH_CHANNEL} channel is disabled, unable to send"
            )));
        };
        let RenderedContent::Push(rendered) = rendered else {
            return Err(DeliveryError::invalid_message(format!(
                "{HTTP_PUSH_CHANNEL} cannot deliver {} content",
                rendered.channel_type()
            )));
        };
        let Some(user_id) = message.recipient().user_id else {
            info!(
                log_id = %message.log_id(),
                "Recipient has no user id, skipping push notification"
            );
            return Ok(());
        };

        let extra = message
            .context()
            .get(PUSH_EXTRA_CONTEXT_KEY)
            .filter(|value| value.is_object())
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));
        let payload = json!({
            "user_id": user_id,
            "title": compress_whitespace(&rendered.title),
            "body": compress_whitespace(&rendered.body),
            "data": extra,
            "message_uuid": message.uuid(),
        });

        let request = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&payload);

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(log_id = %message.log_id(), error = %err, "Push gateway request failed");
                return Err(DeliveryError::recoverable(
                    format!("push gateway request failed: {err}"),
                    default_next_attempt(self.clock.now()),
                ));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(log_id = %message.log_id(), user_id, "Push notification accepted");
            return Ok(());
        }

        let now = self.clock.now();
        let retry_at = retry_after(response.headers(), now);
        let detail = error_detail(&response.text().await.unwrap_or_default());
        check_status("push gateway", status, &detail, || {
            retry_at.unwrap_or_else(|| default_next_attempt(now))
        })
    }
}
