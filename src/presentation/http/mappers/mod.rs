use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Map;

use crate::{
    domain::{
        errors::DomainError,
        models::{ChannelStatus, ChannelType, DeliveryOutcome, Message, SendReport, SkipReason},
        value_objects::Recipient,
    },
    presentation::{
        http::{
            requests::SendMessageRequestDto,
            responses::{ChannelStatusDto, SendReportDto},
        },
        models::{ChannelKind, OutcomeKind},
    },
};

/// A validated send request: the message plus the optional channel
/// restriction.
pub struct SendCommand {
    pub message: Message,
    pub channels: Option<Vec<ChannelType>>,
}

pub fn map_request(
    request: &SendMessageRequestDto,
    now: DateTime<Utc>,
) -> Result<SendCommand, DomainError> {
    let recipient = Recipient::new(
        request.recipient.user_id,
        request.recipient.email_address.clone(),
    );
    let message = Message::new(&request.app_label, &request.name, recipient)?
        .with_context(request.context.clone().into_iter().collect::<Map<_, _>>())
        .with_options(request.options.clone().into_iter().collect::<Map<_, _>>())
        .with_language(request.language.clone())
        .with_expiration_time(
            request
                .expiration_seconds
                .map(|seconds| now + TimeDelta::seconds(i64::from(seconds))),
        )
        .with_send_uuid(request.send_uuid);

    Ok(SendCommand {
        message,
        channels: request
            .channels
            .as_ref()
            .map(|channels| channels.iter().copied().map(ChannelType::from).collect()),
    })
}

pub fn map_report(report: &SendReport) -> SendReportDto {
    SendReportDto {
        message_uuid: report.message_uuid,
        allowed: report.allowed.iter().copied().map(ChannelKind::from).collect(),
        statuses: report.statuses.iter().map(map_status).collect(),
    }
}

fn map_status(status: &ChannelStatus) -> ChannelStatusDto {
    ChannelStatusDto {
        channel_type: status.channel_type.into(),
        outcome: OutcomeKind::from(&status.outcome),
        detail: extract_detail(&status.outcome),
    }
}

fn extract_detail(outcome: &DeliveryOutcome) -> Option<String> {
    match outcome {
        DeliveryOutcome::Skipped { reason } => Some(match reason {
            SkipReason::DeniedByPolicy => "denied by policy".to_string(),
            SkipReason::UnsupportedChannel(detail) => format!("unsupported channel: {detail}"),
            SkipReason::TemplateNotFound(detail) => format!("template not found: {detail}"),
            SkipReason::DeliveryFailed(detail) => format!("delivery failed: {detail}"),
        }),
        _ => None,
    }
}
