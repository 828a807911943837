//! Name-to-implementation table for the channels and policies that can be
//! switched on through configuration.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::{
    application::services::{channel::Channel, clock::Clock, policy::Policy},
    config::Config,
    infrastructure::{
        channels::{
            file_email::{FILE_EMAIL_CHANNEL, FileEmailChannel},
            http_email::{HTTP_EMAIL_CHANNEL, HttpEmailChannel, HttpEmailSettings},
            http_push::{HTTP_PUSH_CHANNEL, HttpPushChannel, HttpPushSettings},
        },
        policies::{
            deny_list::{DENY_LIST_POLICY, DenyListPolicy},
            require_address::{REQUIRE_ADDRESS_POLICY, RequireAddressPolicy},
        },
    },
};

pub const CHANNEL_NAMES: [&str; 3] = [FILE_EMAIL_CHANNEL, HTTP_EMAIL_CHANNEL, HTTP_PUSH_CHANNEL];
pub const POLICY_NAMES: [&str; 2] = [DENY_LIST_POLICY, REQUIRE_ADDRESS_POLICY];

pub struct PluginTable {
    config: Config,
    clock: Arc<dyn Clock>,
}

impl PluginTable {
    pub fn new(config: Config, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    fn channel(&self, name: &str) -> Option<anyhow::Result<Arc<dyn Channel>>> {
        let config = &self.config;
        let channel: anyhow::Result<Arc<dyn Channel>> = match name {
            FILE_EMAIL_CHANNEL => Ok(Arc::new(FileEmailChannel::new(
                config.file_email_dir.clone(),
                self.clock.clone(),
            )) as Arc<dyn Channel>),
            HTTP_EMAIL_CHANNEL => HttpEmailChannel::new(
                HttpEmailSettings {
                    endpoint: config.http_email_endpoint.clone(),
                    api_key: config.http_email_api_key.clone(),
                    from_address: config.http_email_from.clone(),
                    default_from_email: config.default_from_email.clone(),
                },
                self.clock.clone(),
            )
            .map(|channel| Arc::new(channel) as Arc<dyn Channel>),
            HTTP_PUSH_CHANNEL => HttpPushChannel::new(
                HttpPushSettings {
                    endpoint: config.push_endpoint.clone(),
                    api_key: config.push_api_key.clone(),
                },
                self.clock.clone(),
            )
            .map(|channel| Arc::new(channel) as Arc<dyn Channel>),
            _ => return None,
        };
        Some(channel.with_context(|| format!("failed to set up channel {name}")))
    }

    fn policy(&self, name: &str) -> Option<anyhow::Result<Arc<dyn Policy>>> {
        let policy: anyhow::Result<Arc<dyn Policy>> = match name {
            DENY_LIST_POLICY => DenyListPolicy::parse(&self.config.denied_messages)
                .map(|policy| Arc::new(policy) as Arc<dyn Policy>)
                .context("invalid ACE_DENIED_MESSAGES"),
            REQUIRE_ADDRESS_POLICY => Ok(Arc::new(RequireAddressPolicy)),
            _ => return None,
        };
        Some(policy)
    }

    /// Instantiates the named channels in order, leaving out unknown names
    /// and channels missing their settings. A channel that cannot be built
    /// fails startup.
    pub fn load_channels(
        &self,
        names: &[String],
    ) -> anyhow::Result<Vec<(String, Arc<dyn Channel>)>> {
        let mut loaded = Vec::with_capacity(names.len());
        for name in names {
            let Some(channel) = self.channel(name) else {
                warn!(
                    channel = %name,
                    available = ?CHANNEL_NAMES,
                    "Unknown channel in ACE_ENABLED_CHANNELS, skipping"
                );
                continue;
            };
            let channel = channel?;
            if !channel.enabled() {
                info!(channel = %name, "Channel is disabled, skipping");
                continue;
            }
            info!(channel = %name, channel_type = %channel.channel_type(), "Channel enabled");
            loaded.push((name.clone(), channel));
        }
        Ok(loaded)
    }

    /// Instantiates the named policies in order. A policy whose settings do
    /// not parse fails startup.
    pub fn load_policies(&self, names: &[String]) -> anyhow::Result<Vec<(String, Arc<dyn Policy>)>> {
        let mut loaded = Vec::with_capacity(names.len());
        for name in names {
            match self.policy(name) {
                Some(policy) => {
                    info!(policy = %name, "Policy enabled");
                    loaded.push((name.clone(), policy?));
                }
                None => warn!(
                    policy = %name,
                    available = ?POLICY_NAMES,
                    "Unknown policy in ACE_ENABLED_POLICIES, skipping"
                ),
            }
        }
        Ok(loaded)
    }
}
