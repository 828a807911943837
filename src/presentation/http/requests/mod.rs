use std::collections::BTreeMap;

use poem_openapi::Object;
use serde_json::Value;
use uuid::Uuid;

use crate::presentation::models::ChannelKind;

#[derive(Object, Debug, Clone, Default)]
pub struct RecipientDto {
    pub user_id: Option<i64>,
    pub email_address: Option<String>,
}

#[derive(Object, Debug, Clone)]
pub struct SendMessageRequestDto {
    #[oai(validator(min_length = 1))]
    pub app_label: String,
    #[oai(validator(min_length = 1))]
    pub name: String,
    pub recipient: RecipientDto,
    #[oai(default)]
    pub context: BTreeMap<String, Value>,
    #[oai(default)]
    pub options: BTreeMap<String, Value>,
    pub language: Option<String>,
    /// Seconds from now after which delivery is abandoned.
    pub expiration_seconds: Option<u32>,
    pub send_uuid: Option<Uuid>,
    /// Restricts delivery to these channel types; all allowed types when absent.
    pub channels: Option<Vec<ChannelKind>>,
}

#[derive(Object, Debug)]
pub struct BatchSendRequestDto {
    pub messages: Vec<SendMessageRequestDto>,
}
