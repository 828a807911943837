use async_trait::async_trait;

use crate::{
    application::services::channel::Channel,
    domain::{
        errors::RenderError,
        models::{Message, RenderedContent},
    },
};

#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        channel: &dyn Channel,
        message: &Message,
    ) -> Result<RenderedContent, RenderError>;
}
