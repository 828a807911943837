use serde::{Deserialize, Serialize};

use super::ChannelType;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderedEmail {
    pub from_name: String,
    pub subject: String,
    pub body_html: String,
    pub head_html: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderedPushNotification {
    pub title: String,
    pub body: String,
}

/// Channel specific content produced once per (channel, message) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "channel_type", rename_all = "snake_case")]
pub enum RenderedContent {
    Email(RenderedEmail),
    Push(RenderedPushNotification),
}

impl RenderedContent {
    pub fn channel_type(&self) -> ChannelType {
        match self {
            RenderedContent::Email(_) => ChannelType::Email,
            RenderedContent::Push(_) => ChannelType::Push,
        }
    }
}
