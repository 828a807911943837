use std::collections::{BTreeSet, HashMap};

use crate::{
    application::services::policy::Policy,
    domain::{
        errors::DomainError,
        models::{ChannelType, Message, PolicyResult},
    },
};

pub const DENY_LIST_POLICY: &str = "deny_list";

/// Blocks configured channel types for specific messages, keyed by
/// `app_label.name`.
#[derive(Debug, Clone, Default)]
pub struct DenyListPolicy {
    rules: HashMap<String, BTreeSet<ChannelType>>,
}

impl DenyListPolicy {
    pub fn new(rules: HashMap<String, BTreeSet<ChannelType>>) -> Self {
        Self { rules }
    }

    /// Parses `channel_type:unique_name` entries, e.g.
    /// `email:accounts.welcome,push:courses.digest`.
    pub fn parse(entries: &str) -> Result<Self, DomainError> {
        let mut rules: HashMap<String, BTreeSet<ChannelType>> = HashMap::new();
        for entry in entries.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let (channel_type, unique_name) = entry.split_once(':').ok_or_else(|| {
                DomainError::Validation(format!(
                    "deny list entry '{entry}' must look like channel_type:app_label.name"
                ))
            })?;
            let unique_name = unique_name.trim();
            if unique_name.is_empty() {
                return Err(DomainError::Validation(format!(
                    "deny list entry '{entry}' has no message name"
                )));
            }
            rules
                .entry(unique_name.to_string())
                .or_default()
                .insert(channel_type.parse()?);
        }
        Ok(Self { rules })
    }
}

impl Policy for DenyListPolicy {
    fn name(&self) -> &str {
        DENY_LIST_POLICY
    }

    fn check(&self, message: &Message) -> anyhow::Result<PolicyResult> {
        Ok(self
            .rules
            .get(&message.unique_name())
            .map(|denied| PolicyResult::deny(denied.iter().copied()))
            .unwrap_or_default())
    }
}
