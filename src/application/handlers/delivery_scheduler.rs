use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{
    application::services::{channel::Channel, clock::Clock, reporter::Reporter},
    domain::{
        errors::DeliveryError,
        events::MessageSentEvent,
        models::{DeliveryOutcome, Message, RenderedContent},
    },
};

/// Upper bound on how long one delivery may keep the calling task busy,
/// whatever expiration the message asks for.
pub const MAX_EXPIRATION_DELAY_SECONDS: u32 = 5 * 60;
pub const DEFAULT_EXPIRATION_DELAY_SECONDS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverySettings {
    pub default_timeout: TimeDelta,
    pub max_expiration_delay: TimeDelta,
}

impl DeliverySettings {
    pub fn from_seconds(default_timeout: u32, max_expiration_delay: u32) -> Self {
        Self {
            default_timeout: TimeDelta::seconds(i64::from(default_timeout)),
            max_expiration_delay: TimeDelta::seconds(i64::from(
                max_expiration_delay.min(MAX_EXPIRATION_DELAY_SECONDS),
            )),
        }
    }
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self::from_seconds(DEFAULT_EXPIRATION_DELAY_SECONDS, MAX_EXPIRATION_DELAY_SECONDS)
    }
}

pub struct DeliveryScheduler {
    settings: DeliverySettings,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn Reporter>,
    sent_events: Option<broadcast::Sender<MessageSentEvent>>,
}

impl DeliveryScheduler {
    pub fn new(
        settings: DeliverySettings,
        clock: Arc<dyn Clock>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            settings,
            clock,
            reporter,
            sent_events: None,
        }
    }

    pub fn with_sent_events(mut self, sender: broadcast::Sender<MessageSentEvent>) -> Self {
        self.sent_events = Some(sender);
        self
    }

    /// Attempts delivery until it succeeds, fails fatally or runs out of time.
    ///
    /// Recoverable errors are retried at the time the channel suggests, as
    /// long as that time falls inside the expiration window. Running out of
    /// time is reported as [`DeliveryOutcome::Expired`], not as an error.
    pub async fn deliver(
        &self,
        channel: &dyn Channel,
        rendered: &RenderedContent,
        message: &Message,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let log_id = message.log_id();
        let channel_type = channel.channel_type();

        let start_time = self.clock.now();
        let default_expiration_time = start_time + self.settings.default_timeout;
        let max_expiration_time = start_time + self.settings.max_expiration_delay;
        let expiration_time = message
            .expiration_time()
            .unwrap_or(default_expiration_time)
            .min(max_expiration_time);

        debug!(%log_id, channel = channel.name(), "attempting delivery of message");
        while self.clock.now() < expiration_time {
            match channel.deliver(message, rendered).await {
                Ok(()) => {
                    self.reporter.report(
                        message,
                        &format!("{channel_type}_delivery_succeeded"),
                        Value::Bool(true),
                    );
                    self.publish_sent(channel, message);
                    return Ok(DeliveryOutcome::Succeeded);
                }
                Err(DeliveryError::Recoverable {
                    reason,
                    next_attempt_time,
                }) => {
                    debug!(%log_id, %reason, "encountered a recoverable delivery error");
                    if next_attempt_time > expiration_time {
                        debug!(%log_id, "message will expire before delivery can be reattempted, aborting");
                        break;
                    }

                    let wait = (next_attempt_time - self.clock.now())
                        .to_std()
                        .unwrap_or(Duration::ZERO);
                    debug!(%log_id, seconds = wait.as_secs_f64(), "sleeping before reattempting delivery");
                    self.clock.sleep(wait).await;
                    self.reporter.report(
                        message,
                        &format!("{channel_type}_delivery_retried"),
                        json!(wait.as_secs_f64()),
                    );
                }
                Err(err) => {
                    warn!(%log_id, channel = channel.name(), error = %err, "delivery failed");
                    return Err(err);
                }
            }
        }

        let elapsed = (self.clock.now() - start_time)
            .to_std()
            .unwrap_or(Duration::ZERO);
        debug!(%log_id, "{channel_type}_delivery_expired");
        self.reporter.report(
            message,
            &format!("{channel_type}_delivery_expired"),
            json!(elapsed.as_secs_f64()),
        );
        Ok(DeliveryOutcome::Expired)
    }

    fn publish_sent(&self, channel: &dyn Channel, message: &Message) {
        if let Some(sender) = &self.sent_events {
            // No subscribers is fine.
            let _ = sender.send(MessageSentEvent::new(
                channel.name(),
                channel.channel_type(),
                message,
            ));
        }
    }
}
