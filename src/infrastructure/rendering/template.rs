//! File-backed renderer: one directory of small templates per message and
//! channel type, with `{{ key }}` placeholders filled from the message
//! context.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::{
    application::services::{channel::Channel, renderer::Renderer},
    domain::{
        errors::RenderError,
        models::{
            ChannelType, Message, RenderedContent, RenderedEmail, RenderedPushNotification,
        },
    },
};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)\s*\}\}").unwrap());

pub struct TemplateRenderer {
    root: PathBuf,
}

impl TemplateRenderer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn template_path(&self, message: &Message, channel_type: ChannelType, file: &str) -> PathBuf {
        self.root
            .join(message.app_label())
            .join(message.name())
            .join(channel_type.as_str())
            .join(file)
    }

    async fn load(
        &self,
        message: &Message,
        channel_type: ChannelType,
        file: &str,
    ) -> Result<Option<String>, RenderError> {
        let path = self.template_path(message, channel_type, file);
        match tokio::fs::read_to_string(&path).await {
            Ok(template) => Ok(Some(substitute(&template, message.context()))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(RenderError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    async fn required(
        &self,
        message: &Message,
        channel_type: ChannelType,
        file: &str,
    ) -> Result<String, RenderError> {
        self.load(message, channel_type, file)
            .await?
            .ok_or_else(|| RenderError::TemplateNotFound {
                path: self
                    .template_path(message, channel_type, file)
                    .display()
                    .to_string(),
            })
    }

    async fn render_email(&self, message: &Message) -> Result<RenderedEmail, RenderError> {
        let channel_type = ChannelType::Email;
        Ok(RenderedEmail {
            from_name: self.required(message, channel_type, "from_name.txt").await?,
            subject: self.required(message, channel_type, "subject.txt").await?,
            body_html: self.required(message, channel_type, "body.html").await?,
            head_html: self
                .load(message, channel_type, "head.html")
                .await?
                .unwrap_or_default(),
            body: self.required(message, channel_type, "body.txt").await?,
        })
    }

    async fn render_push(
        &self,
        message: &Message,
    ) -> Result<RenderedPushNotification, RenderError> {
        let channel_type = ChannelType::Push;
        Ok(RenderedPushNotification {
            title: self.required(message, channel_type, "title.txt").await?,
            body: self.required(message, channel_type, "body.txt").await?,
        })
    }
}

#[async_trait]
impl Renderer for TemplateRenderer {
    async fn render(
        &self,
        channel: &dyn Channel,
        message: &Message,
    ) -> Result<RenderedContent, RenderError> {
        match channel.channel_type() {
            ChannelType::Email => self.render_email(message).await.map(RenderedContent::Email),
            ChannelType::Push => self.render_push(message).await.map(RenderedContent::Push),
        }
    }
}

/// Replaces `{{ key }}` and `{{ key.nested }}` with context values. Strings
/// are inserted as-is, other values as JSON, unknown keys as nothing.
pub fn substitute(template: &str, context: &Map<String, Value>) -> String {
    PLACEHOLDER
        .replace_all(template, |captures: &Captures| {
            let mut segments = captures[1].split('.');
            let first = segments.next().and_then(|key| context.get(key));
            match segments.fold(first, |value, key| value.and_then(|value| value.get(key))) {
                Some(Value::String(text)) => text.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::*;
    use crate::test_support::{ScriptedChannel, message};

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn context() -> Map<String, Value> {
        json!({
            "user": { "name": "Ada", "id": 42 },
            "course": "Rust 101",
            "seats": 3,
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn substitutes_nested_and_non_string_values() {
        let rendered = substitute(
            "Hi {{user.name}} ({{ user.id }}), {{ seats }} seats left in {{course}}{{ missing }}",
            &context(),
        );

        assert_eq!(rendered, "Hi Ada (42), 3 seats left in Rust 101");
    }

    #[tokio::test]
    async fn renders_email_from_template_directory() {
        let dir = tempfile::tempdir().unwrap();
        let base = "accounts/welcome/email";
        write(dir.path(), &format!("{base}/from_name.txt"), "Platform");
        write(dir.path(), &format!("{base}/subject.txt"), "Welcome {{ user.name }}");
        write(dir.path(), &format!("{base}/body.html"), "<p>{{ course }}</p>");
        write(dir.path(), &format!("{base}/body.txt"), "{{ course }}");
        let renderer = TemplateRenderer::new(dir.path());
        let channel = ScriptedChannel::succeeding(ChannelType::Email, "smtp");

        let rendered = renderer
            .render(channel.as_ref(), &message().with_context(context()))
            .await
            .unwrap();

        assert_eq!(
            rendered,
            RenderedContent::Email(RenderedEmail {
                from_name: "Platform".into(),
                subject: "Welcome Ada".into(),
                body_html: "<p>Rust 101</p>".into(),
                head_html: String::new(),
                body: "Rust 101".into(),
            })
        );
    }

    #[tokio::test]
    async fn renders_push_notification() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "accounts/welcome/push/title.txt", "Hello {{ user.name }}");
        write(dir.path(), "accounts/welcome/push/body.txt", "Enrolled in {{ course }}");
        let renderer = TemplateRenderer::new(dir.path());
        let channel = ScriptedChannel::succeeding(ChannelType::Push, "push");

        let rendered = renderer
            .render(channel.as_ref(), &message().with_context(context()))
            .await
            .unwrap();

        assert_eq!(
            rendered,
            RenderedContent::Push(RenderedPushNotification {
                title: "Hello Ada".into(),
                body: "Enrolled in Rust 101".into(),
            })
        );
    }

    #[tokio::test]
    async fn missing_template_is_reported_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = TemplateRenderer::new(dir.path());
        let channel = ScriptedChannel::succeeding(ChannelType::Push, "push");

        let err = renderer
            .render(channel.as_ref(), &message())
            .await
            .unwrap_err();

        match err {
            RenderError::TemplateNotFound { path } => {
                assert!(path.ends_with("title.txt"), "{path}");
                assert!(path.contains("accounts"), "{path}");
            }
            other => panic!("expected missing template, got {other:?}"),
        }
    }
}
