use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    application::{
        handlers::delivery_scheduler::DeliveryScheduler,
        services::{
            channel::ChannelRegistry, policy::PolicyEngine, renderer::Renderer,
            reporter::Reporter,
        },
    },
    domain::{
        errors::RenderError,
        models::{ChannelStatus, ChannelType, DeliveryOutcome, Message, SendReport, SkipReason},
    },
};

/// Drives one message through policy, channel resolution, rendering and
/// delivery for every allowed channel type.
///
/// A failure on one channel type is recorded against that type and never
/// stops the others.
pub struct SendOrchestrator {
    policies: Arc<PolicyEngine>,
    registry: Arc<ChannelRegistry>,
    renderer: Arc<dyn Renderer>,
    scheduler: Arc<DeliveryScheduler>,
    reporter: Arc<dyn Reporter>,
}

impl SendOrchestrator {
    pub fn new(
        policies: Arc<PolicyEngine>,
        registry: Arc<ChannelRegistry>,
        renderer: Arc<dyn Renderer>,
        scheduler: Arc<DeliveryScheduler>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            policies,
            registry,
            renderer,
            scheduler,
            reporter,
        }
    }

    pub async fn send(&self, message: &Message) -> anyhow::Result<SendReport> {
        self.send_restricted(message, None).await
    }

    /// Like [`SendOrchestrator::send`], limited to `channels` when given.
    ///
    /// Only a failing policy produces an `Err`; every delivery problem ends
    /// up in the returned report.
    pub async fn send_restricted(
        &self,
        message: &Message,
        channels: Option<&[ChannelType]>,
    ) -> anyhow::Result<SendReport> {
        let log_id = message.log_id();
        self.reporter.report_basics(message);

        let mut allowed = self.policies.allowed_types(message)?;
        let mut statuses = Vec::new();

        if let Some(requested) = channels {
            let requested: BTreeSet<ChannelType> = requested.iter().copied().collect();
            for denied in requested.difference(&allowed) {
                info!(%log_id, channel_type = %denied, "requested channel type is denied by policy, skipping");
                statuses.push(ChannelStatus {
                    channel_type: *denied,
                    outcome: DeliveryOutcome::skipped(SkipReason::DeniedByPolicy),
                });
            }
            allowed.retain(|channel_type| requested.contains(channel_type));
        }

        for channel_type in &allowed {
            let outcome = self.send_over(*channel_type, message).await;
            statuses.push(ChannelStatus {
                channel_type: *channel_type,
                outcome,
            });
        }

        Ok(SendReport {
            message_uuid: message.uuid(),
            allowed,
            statuses,
        })
    }

    async fn send_over(&self, channel_type: ChannelType, message: &Message) -> DeliveryOutcome {
        let log_id = message.log_id();

        let channel = match self.registry.resolve_for_message(channel_type, message) {
            Ok(channel) => channel,
            Err(err) => {
                debug!(%log_id, %channel_type, error = %err, "no channel available, skipping");
                return DeliveryOutcome::skipped(SkipReason::UnsupportedChannel(err.to_string()));
            }
        };

        let rendered = match self.renderer.render(channel.as_ref(), message).await {
            Ok(rendered) => rendered,
            Err(err @ RenderError::TemplateNotFound { .. }) => {
                warn!(%log_id, %channel_type, error = %err, "template missing, skipping channel");
                self.reporter
                    .report(message, "template_error", Value::String(err.to_string()));
                return DeliveryOutcome::skipped(SkipReason::TemplateNotFound(err.to_string()));
            }
            Err(err @ RenderError::UnsupportedChannel(_)) => {
                debug!(%log_id, %channel_type, error = %err, "no renderer available, skipping");
                return DeliveryOutcome::skipped(SkipReason::UnsupportedChannel(err.to_string()));
            }
            Err(err) => {
                warn!(%log_id, %channel_type, error = %err, "rendering failed, skipping channel");
                self.reporter.report(
                    message,
                    &format!("{channel_type}_error"),
                    Value::String(err.to_string()),
                );
                return DeliveryOutcome::skipped(SkipReason::DeliveryFailed(err.to_string()));
            }
        };

        match self
            .scheduler
            .deliver(channel.as_ref(), &rendered, message)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                self.reporter.report(
                    message,
                    &format!("{channel_type}_error"),
                    Value::String(err.to_string()),
                );
                DeliveryOutcome::skipped(SkipReason::DeliveryFailed(err.to_string()))
            }
        }
    }
}
