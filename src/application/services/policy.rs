use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use crate::{
    application::services::reporter::Reporter,
    domain::models::{ChannelType, Message, PolicyResult},
};

pub trait Policy: Send + Sync {
    fn name(&self) -> &str;

    /// Which channel types this message must not use. Expected to be a pure
    /// function of the message.
    fn check(&self, message: &Message) -> anyhow::Result<PolicyResult>;
}

pub struct PolicyEngine {
    policies: Vec<Arc<dyn Policy>>,
    reporter: Arc<dyn Reporter>,
}

impl PolicyEngine {
    pub fn new(policies: Vec<Arc<dyn Policy>>, reporter: Arc<dyn Reporter>) -> Self {
        Self { policies, reporter }
    }

    /// Starts from every known channel type and subtracts each policy's deny
    /// set. A failing policy aborts evaluation.
    pub fn allowed_types(&self, message: &Message) -> anyhow::Result<BTreeSet<ChannelType>> {
        let mut allowed: BTreeSet<ChannelType> = ChannelType::ALL.into_iter().collect();

        for policy in &self.policies {
            let result = policy.check(message).map_err(|err| {
                err.context(format!(
                    "policy '{}' failed for message {}",
                    policy.name(),
                    message.log_id()
                ))
            })?;
            allowed.retain(|channel_type| !result.denied().contains(channel_type));
        }

        let names = allowed
            .iter()
            .map(ChannelType::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.reporter
            .report(message, "policy_allowed_channels", Value::String(names));

        Ok(allowed)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::test_support::{FailingPolicy, RecordingReporter, StubPolicy, message};

    fn engine(policies: Vec<Arc<dyn Policy>>) -> (PolicyEngine, Arc<RecordingReporter>) {
        let reporter = Arc::new(RecordingReporter::default());
        (PolicyEngine::new(policies, reporter.clone()), reporter)
    }

    #[test]
    fn no_policies_allows_everything() {
        let (engine, reporter) = engine(vec![]);
        let allowed = engine.allowed_types(&message()).unwrap();
        assert_eq!(allowed, ChannelType::ALL.into_iter().collect());
        assert_eq!(
            reporter.values("policy_allowed_channels"),
            vec![Value::String("email,push".into())]
        );
    }

    #[test]
    fn empty_deny_set_is_a_no_op() {
        let (engine, _) = engine(vec![StubPolicy::allowing_all()]);
        assert_eq!(engine.allowed_types(&message()).unwrap().len(), 2);
    }

    #[test]
    fn denied_types_are_removed() {
        let (engine, reporter) = engine(vec![
            StubPolicy::denying([ChannelType::Push]),
            StubPolicy::allowing_all(),
        ]);
        let allowed = engine.allowed_types(&message()).unwrap();
        assert_eq!(allowed, BTreeSet::from([ChannelType::Email]));
        assert_eq!(
            reporter.values("policy_allowed_channels"),
            vec![Value::String("email".into())]
        );
    }

    #[test]
    fn failing_policy_propagates() {
        let (engine, reporter) = engine(vec![
            StubPolicy::denying([ChannelType::Push]),
            FailingPolicy::shared(),
        ]);
        let err = engine.allowed_types(&message()).unwrap_err();
        assert!(err.to_string().contains("failing"));
        assert!(reporter.values("policy_allowed_channels").is_empty());
    }

    fn channel_type() -> impl Strategy<Value = ChannelType> {
        prop_oneof![Just(ChannelType::Email), Just(ChannelType::Push)]
    }

    fn deny_sets() -> impl Strategy<Value = Vec<BTreeSet<ChannelType>>> {
        prop::collection::vec(prop::collection::btree_set(channel_type(), 0..=2), 0..8)
    }

    fn policies(sets: &[BTreeSet<ChannelType>]) -> Vec<Arc<dyn Policy>> {
        sets.iter()
            .map(|set| StubPolicy::denying(set.iter().copied()))
            .collect()
    }

    proptest! {
        #[test]
        fn evaluation_order_does_not_matter(
            (sets, shuffled) in deny_sets().prop_flat_map(|sets| {
                let shuffled = Just(sets.clone()).prop_shuffle();
                (Just(sets), shuffled)
            })
        ) {
            let msg = message();
            let (forward, _) = engine(policies(&sets));
            let (permuted, _) = engine(policies(&shuffled));

            prop_assert_eq!(
                forward.allowed_types(&msg).unwrap(),
                permuted.allowed_types(&msg).unwrap()
            );
        }

        #[test]
        fn allowed_is_known_minus_union_of_denied(sets in deny_sets()) {
            let msg = message();
            let (policy_engine, _) = engine(policies(&sets));

            let denied: BTreeSet<ChannelType> = sets.iter().flatten().copied().collect();
            let expected: BTreeSet<ChannelType> = ChannelType::ALL
                .into_iter()
                .filter(|channel_type| !denied.contains(channel_type))
                .collect();

            prop_assert_eq!(policy_engine.allowed_types(&msg).unwrap(), expected);
        }
    }
}
