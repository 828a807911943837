use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::models::{ChannelType, Message};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentRecipient {
    pub email: Option<String>,
    pub user_id: Option<i64>,
}

/// Published once a message has been handed to a provider successfully.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageSentEvent {
    pub name: String,
    pub app_label: String,
    pub recipient: SentRecipient,
    pub channel: String,
    pub channel_type: ChannelType,
    pub context: Map<String, Value>,
    pub options: Map<String, Value>,
    pub uuid: Uuid,
    pub send_uuid: Option<Uuid>,
}

impl MessageSentEvent {
    pub fn new(channel: &str, channel_type: ChannelType, message: &Message) -> Self {
        Self {
            name: message.name().to_string(),
            app_label: message.app_label().to_string(),
            recipient: SentRecipient {
                email: message.recipient().email_address.clone(),
                user_id: message.recipient().user_id,
            },
            channel: channel.to_string(),
            channel_type,
            context: message.context().clone(),
            options: message.options().clone(),
            uuid: message.uuid(),
            send_uuid: message.send_uuid(),
        }
    }
}
