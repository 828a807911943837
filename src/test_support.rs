//! Test doubles shared by the unit tests.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::Value;

use crate::{
    application::services::{
        channel::Channel, clock::Clock, policy::Policy, renderer::Renderer, reporter::Reporter,
    },
    domain::{
        errors::{DeliveryError, RenderError},
        models::{
            ChannelType, Message, PolicyResult, RenderedContent, RenderedEmail,
            RenderedPushNotification,
        },
        value_objects::Recipient,
    },
};

pub fn message() -> Message {
    Message::new(
        "accounts",
        "welcome",
        Recipient::new(Some(42), Some("learner@example.com".into())),
    )
    .expect("valid message")
}

pub fn rendered_email() -> RenderedContent {
    RenderedContent::Email(RenderedEmail {
        from_name: "Platform".into(),
        subject: "Welcome".into(),
        body_html: "<p>Hello</p>".into(),
        head_html: String::new(),
        body: "Hello".into(),
    })
}

pub fn rendered_push() -> RenderedContent {
    RenderedContent::Push(RenderedPushNotification {
        title: "Welcome".into(),
        body: "Hello".into(),
    })
}

/// Clock that only moves when something sleeps on it.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid start time");
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }
}

impl ManualClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        let step = TimeDelta::from_std(duration).expect("sleep fits in a TimeDelta");
        *self.now.lock().unwrap() += step;
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    entries: Mutex<Vec<(String, Value)>>,
}

impl RecordingReporter {
    pub fn values(&self, key: &str) -> Vec<Value> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(recorded, _)| recorded == key)
            .map(|(_, value)| value.clone())
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, _message: &Message, key: &str, value: Value) {
        self.entries.lock().unwrap().push((key.to_string(), value));
    }
}

pub struct StubPolicy {
    result: PolicyResult,
}

impl StubPolicy {
    pub fn denying(channel_types: impl IntoIterator<Item = ChannelType>) -> Arc<dyn Policy> {
        Arc::new(Self {
            result: PolicyResult::deny(channel_types),
        })
    }

    pub fn allowing_all() -> Arc<dyn Policy> {
        Arc::new(Self {
            result: PolicyResult::allow_all(),
        })
    }
}

impl Policy for StubPolicy {
    fn name(&self) -> &str {
        "stub"
    }

    fn check(&self, _message: &Message) -> anyhow::Result<PolicyResult> {
        Ok(self.result.clone())
    }
}

pub struct FailingPolicy;

impl FailingPolicy {
    pub fn shared() -> Arc<dyn Policy> {
        Arc::new(Self)
    }
}

impl Policy for FailingPolicy {
    fn name(&self) -> &str {
        "failing"
    }

    fn check(&self, _message: &Message) -> anyhow::Result<PolicyResult> {
        anyhow::bail!("failing policy")
    }
}

#[derive(Debug, Clone)]
pub enum Attempt {
    Succeed,
    Fatal(String),
    InvalidMessage(String),
    RecoverableAfter(TimeDelta),
    RecoverableAt(DateTime<Utc>),
}

/// Channel that plays back a fixed list of attempt results, then repeats
/// `fallback` forever.
pub struct ScriptedChannel {
    channel_type: ChannelType,
    name: String,
    clock: Arc<ManualClock>,
    script: Mutex<VecDeque<Attempt>>,
    fallback: Attempt,
    claims: bool,
    attempts: AtomicUsize,
}

impl ScriptedChannel {
    pub fn new(
        channel_type: ChannelType,
        name: &str,
        clock: Arc<ManualClock>,
        script: Vec<Attempt>,
    ) -> Arc<Self> {
        Arc::new(Self {
            channel_type,
            name: name.to_string(),
            clock,
            script: Mutex::new(script.into()),
            fallback: Attempt::Succeed,
            claims: false,
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn repeating(
        channel_type: ChannelType,
        name: &str,
        clock: Arc<ManualClock>,
        attempt: Attempt,
    ) -> Arc<Self> {
        Arc::new(Self {
            channel_type,
            name: name.to_string(),
            clock,
            script: Mutex::new(VecDeque::new()),
            fallback: attempt,
            claims: false,
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn succeeding(channel_type: ChannelType, name: &str) -> Arc<dyn Channel> {
        Self::new(channel_type, name, Arc::new(ManualClock::default()), vec![])
    }

    pub fn claiming(channel_type: ChannelType, name: &str) -> Arc<dyn Channel> {
        Arc::new(Self {
            channel_type,
            name: name.to_string(),
            clock: Arc::new(ManualClock::default()),
            script: Mutex::new(VecDeque::new()),
            fallback: Attempt::Succeed,
            claims: true,
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn overrides_delivery_for_message(&self, _message: &Message) -> bool {
        self.claims
    }

    async fn deliver(
        &self,
        _message: &Message,
        _rendered: &RenderedContent,
    ) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let attempt = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match attempt {
            Attempt::Succeed => Ok(()),
            Attempt::Fatal(reason) => Err(DeliveryError::fatal(reason)),
            Attempt::InvalidMessage(reason) => Err(DeliveryError::invalid_message(reason)),
            Attempt::RecoverableAfter(delay) => Err(DeliveryError::recoverable(
                "try again later",
                self.clock.now() + delay,
            )),
            Attempt::RecoverableAt(at) => Err(DeliveryError::recoverable("try again later", at)),
        }
    }
}

/// Renderer returning fixed content, optionally pretending some templates
/// are missing.
#[derive(Default)]
pub struct StaticRenderer {
    missing: BTreeSet<ChannelType>,
}

impl StaticRenderer {
    pub fn missing(channel_types: impl IntoIterator<Item = ChannelType>) -> Self {
        Self {
            missing: channel_types.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn render(
        &self,
        channel: &dyn Channel,
        message: &Message,
    ) -> Result<RenderedContent, RenderError> {
        let channel_type = channel.channel_type();
        if self.missing.contains(&channel_type) {
            return Err(RenderError::TemplateNotFound {
                path: format!(
                    "{}/{}/{}/subject.txt",
                    message.app_label(),
                    message.name(),
                    channel_type
                ),
            });
        }
        Ok(match channel_type {
            ChannelType::Email => rendered_email(),
            ChannelType::Push => rendered_push(),
        })
    }
}
