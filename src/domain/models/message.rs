//! Message value objects: a [`Message`] is one notification to one
//! recipient, a [`MessageType`] is the template it is personalized from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{errors::DomainError, value_objects::Recipient};

pub const TRANSACTIONAL_OPTION: &str = "transactional";
pub const FROM_ADDRESS_OPTION: &str = "from_address";
pub const REPLY_TO_OPTION: &str = "reply_to";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "MessageRecord")]
pub struct Message {
    app_label: String,
    name: String,
    recipient: Recipient,
    context: Map<String, Value>,
    options: Map<String, Value>,
    language: Option<String>,
    expiration_time: Option<DateTime<Utc>>,
    uuid: Uuid,
    send_uuid: Option<Uuid>,
}

/// Wire shape of a [`Message`], validated on the way in.
#[derive(Deserialize)]
struct MessageRecord {
    app_label: String,
    name: String,
    #[serde(default)]
    recipient: Recipient,
    #[serde(default)]
    context: Map<String, Value>,
    #[serde(default)]
    options: Map<String, Value>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    expiration_time: Option<DateTime<Utc>>,
    uuid: Uuid,
    #[serde(default)]
    send_uuid: Option<Uuid>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = DomainError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        let mut message = Message::new(record.app_label, record.name, record.recipient)?;
        message.uuid = record.uuid;
        message.context = record.context;
        message.options = record.options;
        message.language = record.language;
        message.expiration_time = record.expiration_time;
        message.send_uuid = record.send_uuid;
        Ok(message)
    }
}

impl Message {
    /// Build a message with a freshly generated uuid.
    pub fn new(
        app_label: impl Into<String>,
        name: impl Into<String>,
        recipient: Recipient,
    ) -> Result<Self, DomainError> {
        let app_label = app_label.into();
        let name = name.into();
        check_identifier("app_label", &app_label)?;
        check_identifier("name", &name)?;

        Ok(Self {
            app_label,
            name,
            recipient,
            context: Map::new(),
            options: Map::new(),
            language: None,
            expiration_time: None,
            uuid: Uuid::new_v4(),
            send_uuid: None,
        })
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = options;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_expiration_time(mut self, expiration_time: Option<DateTime<Utc>>) -> Self {
        self.expiration_time = expiration_time;
        self
    }

    pub fn with_send_uuid(mut self, send_uuid: Option<Uuid>) -> Self {
        self.send_uuid = send_uuid;
        self
    }

    pub fn app_label(&self) -> &str {
        &self.app_label
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn expiration_time(&self) -> Option<DateTime<Utc>> {
        self.expiration_time
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn send_uuid(&self) -> Option<Uuid> {
        self.send_uuid
    }

    pub fn unique_name(&self) -> String {
        format!("{}.{}", self.app_label, self.name)
    }

    /// Identity used on every log line and report about this message.
    pub fn log_id(&self) -> String {
        let send_uuid = self
            .send_uuid
            .map(|uuid| uuid.to_string())
            .unwrap_or_else(|| "no_send_uuid".to_string());
        format!("{}.{}.{}", self.unique_name(), send_uuid, self.uuid)
    }

    pub fn is_transactional(&self) -> bool {
        self.options
            .get(TRANSACTIONAL_OPTION)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }
}

/// `app_label` and `name` double as template directory names, so they are
/// limited to ASCII letters, digits, `_`, `-` and single dots.
fn check_identifier(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be empty")));
    }
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !allowed || value.starts_with('.') || value.contains("..") {
        return Err(DomainError::Validation(format!(
            "{field} '{value}' may only contain letters, digits, '_', '-' and single dots"
        )));
    }
    Ok(())
}

/// A batch-level template; [`MessageType::personalize`] turns it into one
/// [`Message`] per recipient sharing the same `send_uuid`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageType {
    pub app_label: String,
    pub name: String,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub expiration_time: Option<DateTime<Utc>>,
    pub uuid: Uuid,
}

impl MessageType {
    pub fn new(app_label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            name: name.into(),
            context: Map::new(),
            options: Map::new(),
            expiration_time: None,
            uuid: Uuid::new_v4(),
        }
    }

    pub fn personalize(
        &self,
        recipient: Recipient,
        language: Option<String>,
        user_context: Map<String, Value>,
    ) -> Result<Message, DomainError> {
        let mut context = self.context.clone();
        context.extend(user_context);

        Ok(Message::new(self.app_label.clone(), self.name.clone(), recipient)?
            .with_context(context)
            .with_options(self.options.clone())
            .with_language(language)
            .with_expiration_time(self.expiration_time)
            .with_send_uuid(Some(self.uuid)))
    }
}
