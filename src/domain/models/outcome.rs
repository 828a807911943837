use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ChannelType;

/// Why a channel type was not delivered to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Requested by the caller but denied by a policy.
    DeniedByPolicy,
    /// No channel implementation could be resolved.
    UnsupportedChannel(String),
    /// Rendering could not find a template.
    TemplateNotFound(String),
    /// The channel reported a fatal error.
    DeliveryFailed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Succeeded,
    Expired,
    Skipped { reason: SkipReason },
}

impl DeliveryOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelStatus {
    pub channel_type: ChannelType,
    pub outcome: DeliveryOutcome,
}

/// What happened to one message across all of its channel types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendReport {
    pub message_uuid: Uuid,
    pub allowed: BTreeSet<ChannelType>,
    pub statuses: Vec<ChannelStatus>,
}

impl SendReport {
    pub fn outcome_for(&self, channel_type: ChannelType) -> Option<&DeliveryOutcome> {
        self.statuses
            .iter()
            .find(|status| status.channel_type == channel_type)
            .map(|status| &status.outcome)
    }

    pub fn delivered(&self) -> impl Iterator<Item = ChannelType> + '_ {
        self.statuses
            .iter()
            .filter(|status| status.outcome == DeliveryOutcome::Succeeded)
            .map(|status| status.channel_type)
    }
}
