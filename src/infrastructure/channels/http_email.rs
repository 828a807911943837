//! Email delivery through a transactional email provider's REST API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use super::{check_status, default_next_attempt, email, error_detail, retry_after};
use crate::{
    application::services::{channel::Channel, clock::Clock},
    domain::{
        errors::DeliveryError,
        models::{ChannelType, Message, RenderedContent, message::REPLY_TO_OPTION},
    },
};

pub const HTTP_EMAIL_CHANNEL: &str = "http_email";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default)]
pub struct HttpEmailSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Overrides any per-message sender; providers usually only accept
    /// verified addresses.
    pub from_address: Option<String>,
    pub default_from_email: Option<String>,
}

pub struct HttpEmailChannel {
    settings: HttpEmailSettings,
    client: Client,
    clock: Arc<dyn Clock>,
}

impl HttpEmailChannel {
    pub fn new(settings: HttpEmailSettings, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("ace-router/http-email")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build the email provider client")?;
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
impl Channel for HttpEmailChannel {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Email
    }

    fn name(&self) -> &str {
        HTTP_EMAIL_CHANNEL
    }

    fn enabled(&self) -> bool {
        let mut ok = true;
        for (setting, value) in [
            ("ACE_HTTP_EMAIL_ENDPOINT", &self.settings.endpoint),
            ("ACE_HTTP_EMAIL_API_KEY", &self.settings.api_key),
        ] {
            if Self::configured(value).is_none() {
                warn!("{setting} is not set, {HTTP_EMAIL_CHANNEL} channel is disabled");
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
                "{HTTP_EMAIL_CHANNEL} channel is disabled, unable to send"
            )));
        };
        let RenderedContent::Email(rendered) = rendered else {
            return Err(DeliveryError::invalid_message(format!(
                "{HTTP_EMAIL_CHANNEL} cannot deliver {} content",
                rendered.channel_type()
            )));
        };
        let Some(to) = message.recipient().email_address.as_deref() else {
            return Err(DeliveryError::invalid_message(
                "recipient has no email address",
            ));
        };

        let from = match Self::configured(&self.settings.from_address) {
            Some(from) => from.to_string(),
            None => email::from_address(
                message,
                Self::configured(&self.settings.default_from_email),
            )?,
        };

        let payload = json!({
            "to": to,
            "from": from,
            "from_name": rendered.from_name.trim(),
            "reply_to": message.option_str(REPLY_TO_OPTION),
            "subject": email::compress_whitespace(&rendered.subject),
            "html": email::simple_html_document(&rendered.head_html, &rendered.body_html),
            "text": rendered.body,
            "transactional": message.is_transactional(),
            "message_uuid": message.uuid(),
        });

        debug!(log_id = %message.log_id(), endpoint, "Sending email to provider");

        let response = match self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(log_id = %message.log_id(), error = %err, "Email provider request failed");
                return Err(DeliveryError::recoverable(
                    format!("email provider request failed: {err}"),
                    default_next_attempt(self.clock.now()),
                ));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(log_id = %message.log_id(), %status, "Email accepted by provider");
            return Ok(());
        }

        let now = self.clock.now();
        let retry_at = retry_after(response.headers(), now);
        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body);
        debug!(log_id = %message.log_id(), %status, detail = %detail, "Email provider rejected message");

        check_status("email provider", status, &detail, || {
            retry_at.unwrap_or_else(|| default_next_attempt(now))
        })
    }
}
