use std::sync::Arc;

use poem_openapi::Tags;

use crate::application::{services::clock::Clock, usecases::send_message::SendOrchestrator};

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<SendOrchestrator>,
    pub clock: Arc<dyn Clock>,
}

pub struct Endpoints;

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Messages,
}
