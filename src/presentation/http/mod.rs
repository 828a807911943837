use std::sync::Arc;

use poem::Route;
use poem_openapi::OpenApiService;

use crate::presentation::http::endpoints::{
    messages::MessagesEndpoints,
    root::{ApiState, Endpoints},
};

pub mod endpoints;
pub mod mappers;
pub mod requests;
pub mod responses;

/// API under `/api`, Swagger UI at `/`.
pub fn build_routes(state: Arc<ApiState>, server_url: &str) -> Route {
    let api_service = OpenApiService::new(
        (Endpoints, MessagesEndpoints::new(state)),
        "ACE Router API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("{server_url}/api"));
    let ui = api_service.swagger_ui();
    Route::new().nest("/api", api_service).nest("/", ui)
}
