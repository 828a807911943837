use serde_json::Value;

use crate::domain::models::Message;

/// Fire-and-forget sink for delivery telemetry.
pub trait Reporter: Send + Sync {
    fn report(&self, message: &Message, key: &str, value: Value);

    fn report_basics(&self, message: &Message) {
        self.report(message, "message_name", Value::String(message.unique_name()));
        self.report(
            message,
            "language",
            message
                .language()
                .map(|language| Value::String(language.to_string()))
                .unwrap_or(Value::Null),
        );
    }
}
