//! Development email channel that writes each rendered email to disk
//! instead of sending it.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::email::compress_whitespace;
use crate::{
    application::services::{channel::Channel, clock::Clock},
    domain::{
        errors::DeliveryError,
        models::{ChannelType, Message, RenderedContent, RenderedEmail},
    },
};

pub const FILE_EMAIL_CHANNEL: &str = "file_email";
/// Message option overriding the generated file name. Must be a relative
/// path; it is resolved under the channel's output directory.
pub const OUTPUT_FILE_PATH_OPTION: &str = "output_file_path";

pub struct FileEmailChannel {
    output_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileEmailChannel {
    pub fn new(output_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            output_dir: output_dir.into(),
            clock,
        }
    }

    fn output_path(&self, message: &Message) -> Result<PathBuf, DeliveryError> {
        if let Some(path) = message.option_str(OUTPUT_FILE_PATH_OPTION) {
            let relative = Path::new(path);
            let confined = !relative.as_os_str().is_empty()
                && relative
                    .components()
                    .all(|component| matches!(component, Component::Normal(_)));
            if !confined {
                return Err(DeliveryError::invalid_message(format!(
                    "{OUTPUT_FILE_PATH_OPTION} '{path}' must stay inside the output directory"
                )));
            }
            return Ok(self.output_dir.join(relative));
        }
        let recipient = message
            .recipient()
            .user_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "anonymous".to_string());
        let stamp = self.clock.now().format("%Y%m%d-%H%M%S");
        Ok(self.output_dir.join(format!("{recipient}.{stamp}.html")))
    }

    fn document(message: &Message, email: &RenderedEmail) -> String {
        let address = message.recipient().email_address.as_deref().unwrap_or("");
        format!(
            "<!DOCTYPE html>\n<html>\n    <head>\n        {head}\n    </head>\n    <body>\n        {body_html}\n    </body>\n    <!-- to: {address} -->\n    <!-- from_name: {from_name} -->\n    <!-- subject: {subject} -->\n    <!-- body: {body} -->\n</html>\n",
            head = email.head_html.trim(),
            body_html = email.body_html.trim(),
            from_name = email.from_name.trim(),
            subject = compress_whitespace(&email.subject),
            body = email.body.trim(),
        )
    }
}

async fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await
}

#[async_trait]
impl Channel for FileEmailChannel {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Email
    }

    fn name(&self) -> &str {
        FILE_EMAIL_CHANNEL
    }

    async fn deliver(
        &self,
        message: &Message,
        rendered: &RenderedContent,
    ) -> Result<(), DeliveryError> {
        let RenderedContent::Email(email) = rendered else {
            return Err(DeliveryError::invalid_message(format!(
                "{FILE_EMAIL_CHANNEL} cannot deliver {} content",
                rendered.channel_type()
            )));
        };

        let path = self.output_path(message)?;
        write_file(&path, &Self::document(message, email))
            .await
            .map_err(|err| {
                DeliveryError::fatal(format!("failed to write {}: {err}", path.display()))
            })?;

        info!(
            log_id = %message.log_id(),
            path = %path.display(),
            to = message.recipient().email_address.as_deref().unwrap_or(""),
            from = %email.from_name.trim(),
            subject = %compress_whitespace(&email.subject),
            body = %email.body.trim(),
            "Email written to file"
        );
        Ok(())
    }
}
