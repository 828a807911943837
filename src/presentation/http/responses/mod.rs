use poem_openapi::Object;
use uuid::Uuid;

use crate::presentation::models::{ChannelKind, OutcomeKind};

#[derive(Object, Debug, Clone)]
pub struct ChannelStatusDto {
    pub channel_type: ChannelKind,
    pub outcome: OutcomeKind,
    pub detail: Option<String>,
}

#[derive(Object, Debug, Clone)]
pub struct SendReportDto {
    pub message_uuid: Uuid,
    pub allowed: Vec<ChannelKind>,
    pub statuses: Vec<ChannelStatusDto>,
}

#[derive(Object)]
pub struct BatchSendItemResultDto {
    pub index: u32,
    pub success: bool,
    pub report: Option<SendReportDto>,
    pub error: Option<String>,
}

#[derive(Object)]
pub struct BatchSendResponseDto {
    pub results: Vec<BatchSendItemResultDto>,
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
}
