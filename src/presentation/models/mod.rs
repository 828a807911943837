use poem_openapi::Enum;

use crate::domain::models::{ChannelType, DeliveryOutcome};

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChannelKind {
    #[oai(rename = "email")]
    Email,
    #[oai(rename = "push")]
    Push,
}

impl From<ChannelKind> for ChannelType {
    fn from(value: ChannelKind) -> Self {
        match value {
            ChannelKind::Email => ChannelType::Email,
            ChannelKind::Push => ChannelType::Push,
        }
    }
}

impl From<ChannelType> for ChannelKind {
    fn from(value: ChannelType) -> Self {
        match value {
            ChannelType::Email => ChannelKind::Email,
            ChannelType::Push => ChannelKind::Push,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutcomeKind {
    #[oai(rename = "succeeded")]
    Succeeded,
    #[oai(rename = "expired")]
    Expired,
    #[oai(rename = "skipped")]
    Skipped,
}

impl From<&DeliveryOutcome> for OutcomeKind {
    fn from(value: &DeliveryOutcome) -> Self {
        match value {
            DeliveryOutcome::Succeeded => OutcomeKind::Succeeded,
            DeliveryOutcome::Expired => OutcomeKind::Expired,
            DeliveryOutcome::Skipped { .. } => OutcomeKind::Skipped,
        }
    }
}
