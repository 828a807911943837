use std::collections::BTreeSet;

use crate::domain::{errors::DomainError, models::ChannelType};

/// The channel types one policy denies for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyResult {
    deny: BTreeSet<ChannelType>,
}

impl PolicyResult {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn deny(channel_types: impl IntoIterator<Item = ChannelType>) -> Self {
        Self {
            deny: channel_types.into_iter().collect(),
        }
    }

    /// Build a result from channel type names, rejecting anything outside
    /// the known set.
    pub fn deny_names<I, S>(names: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let deny = names
            .into_iter()
            .map(|name| name.as_ref().parse::<ChannelType>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|err| DomainError::Validation(format!("PolicyResult: {err}")))?;
        Ok(Self { deny })
    }

    pub fn denied(&self) -> &BTreeSet<ChannelType> {
        &self.deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_names_validates_every_entry() {
        let result = PolicyResult::deny_names(["email", "PUSH"]).unwrap();
        assert_eq!(
            result.denied().iter().copied().collect::<Vec<_>>(),
            vec![ChannelType::Email, ChannelType::Push]
        );

        assert!(PolicyResult::deny_names(["email", "carrier_pigeon"]).is_err());
    }
}
