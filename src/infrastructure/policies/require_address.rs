use crate::{
    application::services::policy::Policy,
    domain::models::{ChannelType, Message, PolicyResult},
};

pub const REQUIRE_ADDRESS_POLICY: &str = "require_address";

/// Denies the channel types the recipient cannot be reached on.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireAddressPolicy;

impl Policy for RequireAddressPolicy {
    fn name(&self) -> &str {
        REQUIRE_ADDRESS_POLICY
    }

    fn check(&self, message: &Message) -> anyhow::Result<PolicyResult> {
        let recipient = message.recipient();
        let mut denied = Vec::new();
        if recipient.email_address.is_none() {
            denied.push(ChannelType::Email);
        }
        if recipient.user_id.is_none() {
            denied.push(ChannelType::Push);
        }
        Ok(PolicyResult::deny(denied))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::value_objects::Recipient;

    #[rstest]
    #[case(Recipient::new(Some(7), Some("a@example.com".into())), vec![])]
    #[case(Recipient::user(7), vec![ChannelType::Email])]
    #[case(Recipient::email("a@example.com"), vec![ChannelType::Push])]
    #[case(Recipient::new(None, Some("   ".into())), vec![ChannelType::Email, ChannelType::Push])]
    fn denies_unreachable_channels(#[case] recipient: Recipient, #[case] denied: Vec<ChannelType>) {
        let msg = Message::new("accounts", "welcome", recipient).unwrap();

        assert_eq!(
            RequireAddressPolicy.check(&msg).unwrap(),
            PolicyResult::deny(denied)
        );
    }
}
