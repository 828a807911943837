use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::models::ChannelType;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure raised by a channel while handing content to its provider.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeliveryError {
    /// Permanent failure; retrying cannot help.
    #[error("fatal delivery error: {reason}")]
    Fatal { reason: String },
    /// Transient failure; the provider suggests trying again at `next_attempt_time`.
    #[error("recoverable delivery error: {reason} (next attempt at {next_attempt_time})")]
    Recoverable {
        reason: String,
        next_attempt_time: DateTime<Utc>,
    },
    /// The message cannot be sent over this channel at all.
    #[error("invalid message: {reason}")]
    InvalidMessage { reason: String },
}

impl DeliveryError {
    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal {
            reason: reason.into(),
        }
    }

    pub fn recoverable(reason: impl Into<String>, next_attempt_time: DateTime<Utc>) -> Self {
        Self::Recoverable {
            reason: reason.into(),
            next_attempt_time,
        }
    }

    pub fn invalid_message(reason: impl Into<String>) -> Self {
        Self::InvalidMessage {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("unsupported channel {channel_type}: {reason}")]
    UnsupportedChannel {
        channel_type: ChannelType,
        reason: String,
    },
    #[error("no {channel_type} channel registered under '{name}'")]
    NotFound {
        channel_type: ChannelType,
        name: String,
    },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {path}")]
    TemplateNotFound { path: String },
    #[error("no renderer is registered for the channel [{0}]")]
    UnsupportedChannel(ChannelType),
    #[error("failed to read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
