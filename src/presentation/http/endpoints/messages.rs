use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, payload::Json};
use tracing::warn;

use crate::{
    domain::errors::DomainError,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::{SendCommand, map_report, map_request},
        requests::{BatchSendRequestDto, SendMessageRequestDto},
        responses::{BatchSendItemResultDto, BatchSendResponseDto, SendReportDto},
    },
};

const MAX_BATCH_SIZE: usize = 100;

#[derive(Clone)]
pub struct MessagesEndpoints {
    state: Arc<ApiState>,
}

impl MessagesEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }

    async fn send_one(&self, request: &SendMessageRequestDto) -> Result<SendReportDto, SendFailure> {
        let SendCommand { message, channels } =
            map_request(request, self.state.clock.now()).map_err(SendFailure::Invalid)?;

        let report = self
            .state
            .orchestrator
            .send_restricted(&message, channels.as_deref())
            .await
            .map_err(|err| {
                warn!(log_id = %message.log_id(), error = %format!("{err:#}"), "send aborted");
                SendFailure::Aborted(err)
            })?;

        Ok(map_report(&report))
    }
}

enum SendFailure {
    Invalid(DomainError),
    Aborted(anyhow::Error),
}

impl SendFailure {
    fn message(&self) -> String {
        match self {
            SendFailure::Invalid(err) => err.to_string(),
            SendFailure::Aborted(err) => format!("{err:#}"),
        }
    }
}

impl From<SendFailure> for poem::Error {
    fn from(value: SendFailure) -> Self {
        let status = match value {
            SendFailure::Invalid(_) => poem::http::StatusCode::BAD_REQUEST,
            SendFailure::Aborted(_) => poem::http::StatusCode::INTERNAL_SERVER_ERROR,
        };
        poem::Error::from_string(value.message(), status)
    }
}

#[OpenApi]
impl MessagesEndpoints {
    /// Send one message over every channel type its policies allow.
    #[oai(
        path = "/messages/send",
        method = "post",
        tag = EndpointsTags::Messages,
    )]
    pub async fn send_message(
        &self,
        request: Json<SendMessageRequestDto>,
    ) -> PoemResult<Json<SendReportDto>> {
        Ok(Json(self.send_one(&request).await?))
    }

    /// Send up to 100 messages; each item succeeds or fails on its own.
    #[oai(
        path = "/messages/batch",
        method = "post",
        tag = EndpointsTags::Messages,
    )]
    pub async fn batch_send(
        &self,
        request: Json<BatchSendRequestDto>,
    ) -> PoemResult<Json<BatchSendResponseDto>> {
        if request.messages.is_empty() {
            return Err(poem::Error::from_string(
                "messages array cannot be empty",
                poem::http::StatusCode::BAD_REQUEST,
            ));
        }

        if request.messages.len() > MAX_BATCH_SIZE {
            return Err(poem::Error::from_string(
                format!("messages array cannot exceed {MAX_BATCH_SIZE} items"),
                poem::http::StatusCode::BAD_REQUEST,
            ));
        }

        let mut results = Vec::with_capacity(request.messages.len());
        let mut successful = 0;
        let mut failed = 0;

        for (index, item) in request.messages.iter().enumerate() {
            match self.send_one(item).await {
                Ok(report) => {
                    successful += 1;
                    results.push(BatchSendItemResultDto {
                        index: index as u32,
                        success: true,
                        report: Some(report),
                        error: None,
                    });
                }
                Err(err) => {
                    failed += 1;
                    results.push(BatchSendItemResultDto {
                        index: index as u32,
                        success: false,
                        report: None,
                        error: Some(err.message()),
                    });
                }
            }
        }

        Ok(Json(BatchSendResponseDto {
            results,
            total: request.messages.len() as u32,
            successful,
            failed,
        }))
    }
}

#[cfg(test)]
mod tests {
    use poem::{http::StatusCode, test::TestClient};
    use serde_json::json;

    use super::*;
    use crate::{
        application::{
            handlers::delivery_scheduler::{DeliveryScheduler, DeliverySettings},
            services::{
                channel::{Channel, ChannelRegistry, EmailChannelSelection},
                policy::PolicyEngine,
            },
            usecases::send_message::SendOrchestrator,
        },
        domain::models::ChannelType,
        presentation::http::build_routes,
        test_support::{ManualClock, RecordingReporter, ScriptedChannel, StaticRenderer},
    };

    fn client() -> TestClient<poem::Route> {
        let clock = Arc::new(ManualClock::default());
        let reporter = Arc::new(RecordingReporter::default());
        let channels: Vec<(String, Arc<dyn Channel>)> = vec![
            (
                "smtp".to_string(),
                ScriptedChannel::succeeding(ChannelType::Email, "smtp"),
            ),
            (
                "push".to_string(),
                ScriptedChannel::succeeding(ChannelType::Push, "push"),
            ),
        ];
        let orchestrator = SendOrchestrator::new(
            Arc::new(PolicyEngine::new(vec![], reporter.clone())),
            Arc::new(ChannelRegistry::new(channels, EmailChannelSelection::default())),
            Arc::new(StaticRenderer::default()),
            Arc::new(DeliveryScheduler::new(
                DeliverySettings::default(),
                clock.clone(),
                reporter.clone(),
            )),
            reporter,
        );
        let state = Arc::new(ApiState {
            orchestrator: Arc::new(orchestrator),
            clock,
        });
        TestClient::new(build_routes(state, "http://localhost:3000"))
    }

    fn body(name: &str) -> serde_json::Value {
        json!({
            "app_label": "accounts",
            "name": name,
            "recipient": { "user_id": 42, "email_address": "learner@example.com" },
            "context": { "course": "Rust 101" },
        })
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = client().get("/api/health").send().await;

        response.assert_status_is_ok();
        response.assert_text("OK").await;
    }

    #[tokio::test]
    async fn send_returns_per_channel_statuses() {
        let response = client()
            .post("/api/messages/send")
            .body_json(&body("welcome"))
            .send()
            .await;

        response.assert_status_is_ok();
        let json = response.json().await;
        let statuses = json.value().object().get("statuses").array();
        statuses.assert_len(2);
        statuses.get(0).object().get("channel_type").assert_string("email");
        statuses.get(0).object().get("outcome").assert_string("succeeded");
        statuses.get(1).object().get("channel_type").assert_string("push");
    }

    #[tokio::test]
    async fn send_honours_channel_restriction() {
        let mut request = body("welcome");
        request["channels"] = json!(["push"]);

        let response = client()
            .post("/api/messages/send")
            .body_json(&request)
            .send()
            .await;

        response.assert_status_is_ok();
        let json = response.json().await;
        json.value().object().get("statuses").array().assert_len(1);
    }

    #[tokio::test]
    async fn blank_name_is_a_bad_request() {
        let response = client()
            .post("/api/messages/send")
            .body_json(&body(" "))
            .send()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn path_like_app_label_is_a_bad_request() {
        let mut request = body("welcome");
        request["app_label"] = json!("/tmp/outside");

        let response = client()
            .post("/api/messages/send")
            .body_json(&request)
            .send()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn batch_isolates_failing_items() {
        let response = client()
            .post("/api/messages/batch")
            .body_json(&json!({ "messages": [body("welcome"), body(" "), body("digest")] }))
            .send()
            .await;

        response.assert_status_is_ok();
        let json = response.json().await;
        let object = json.value().object();
        object.get("total").assert_i64(3);
        object.get("successful").assert_i64(2);
        object.get("failed").assert_i64(1);
        object
            .get("results")
            .array()
            .get(1)
            .object()
            .get("success")
            .assert_bool(false);
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected() {
        let messages: Vec<_> = (0..101).map(|_| body("welcome")).collect();

        let response = client()
            .post("/api/messages/batch")
            .body_json(&json!({ "messages": messages }))
            .send()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
