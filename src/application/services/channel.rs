use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    errors::{DeliveryError, RoutingError},
    models::{ChannelType, Message, RenderedContent},
};

#[async_trait]
pub trait Channel: Send + Sync {
    fn channel_type(&self) -> ChannelType;

    fn name(&self) -> &str;

    /// Whether the channel has everything it needs (settings, credentials)
    /// to deliver.
    fn enabled(&self) -> bool {
        true
    }

    /// Lets a channel claim a message ahead of the normal selection rules.
    fn overrides_delivery_for_message(&self, _message: &Message) -> bool {
        false
    }

    async fn deliver(
        &self,
        message: &Message,
        rendered: &RenderedContent,
    ) -> Result<(), DeliveryError>;
}

/// Names of the email channels to prefer over the registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailChannelSelection {
    pub default: Option<String>,
    pub transactional: Option<String>,
}

/// Channels keyed by type, then by name in registration order.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    channels: HashMap<ChannelType, Vec<(String, Arc<dyn Channel>)>>,
    email: EmailChannelSelection,
}

impl ChannelRegistry {
    pub fn new(channels: Vec<(String, Arc<dyn Channel>)>, email: EmailChannelSelection) -> Self {
        let mut registry = Self {
            channels: HashMap::new(),
            email,
        };
        for (name, channel) in channels {
            registry.register(name, channel);
        }
        registry
    }

    /// Registering an existing name again replaces the channel but keeps
    /// its original position.
    pub fn register(&mut self, name: impl Into<String>, channel: Arc<dyn Channel>) {
        let name = name.into();
        let entries = self.channels.entry(channel.channel_type()).or_default();
        match entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = channel,
            None => entries.push((name, channel)),
        }
    }

    pub fn get_by_name(
        &self,
        channel_type: ChannelType,
        name: &str,
    ) -> Result<Arc<dyn Channel>, RoutingError> {
        self.channels
            .get(&channel_type)
            .and_then(|entries| entries.iter().find(|(existing, _)| existing == name))
            .map(|(_, channel)| channel.clone())
            .ok_or_else(|| RoutingError::NotFound {
                channel_type,
                name: name.to_string(),
            })
    }

    pub fn get_default(&self, channel_type: ChannelType) -> Result<Arc<dyn Channel>, RoutingError> {
        self.channels
            .get(&channel_type)
            .and_then(|entries| entries.first())
            .map(|(_, channel)| channel.clone())
            .ok_or_else(|| RoutingError::UnsupportedChannel {
                channel_type,
                reason: format!(
                    "no implementation is registered, available channels are: [{}]",
                    self.names().join(", ")
                ),
            })
    }

    pub fn resolve_for_message(
        &self,
        channel_type: ChannelType,
        message: &Message,
    ) -> Result<Arc<dyn Channel>, RoutingError> {
        match channel_type {
            ChannelType::Email => self.resolve_email(message),
            _ => self.get_default(channel_type),
        }
    }

    fn resolve_email(&self, message: &Message) -> Result<Arc<dyn Channel>, RoutingError> {
        let mut names = Vec::with_capacity(2);
        if message.is_transactional() {
            names.push(self.email.transactional.as_deref());
        }
        names.push(self.email.default.as_deref());

        let candidates = names
            .into_iter()
            .map(|name| name.and_then(|name| self.get_by_name(ChannelType::Email, name).ok()))
            .collect::<Option<Vec<_>>>();

        let Some(candidates) = candidates else {
            return self.get_default(ChannelType::Email);
        };

        if let Some(claimed) = candidates
            .iter()
            .find(|channel| channel.overrides_delivery_for_message(message))
        {
            return Ok(claimed.clone());
        }

        match candidates.into_iter().next() {
            Some(preferred) => Ok(preferred),
            None => self.get_default(ChannelType::Email),
        }
    }

    pub fn names(&self) -> Vec<String> {
        ChannelType::ALL
            .iter()
            .filter_map(|channel_type| self.channels.get(channel_type))
            .flat_map(|entries| entries.iter().map(|(name, _)| name.clone()))
            .collect()
    }
}
