//! Status surface: status page, manual run trigger and health check.

mod middleware;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::info;

use crate::application::error::AppError;
use crate::application::publish::{Publisher, RunReport};
use crate::presentation::views::{StatusTemplate, StatusView, render_template};

pub const BUSY_MESSAGE: &str = "A run is already in progress";

#[derive(Clone)]
pub struct HttpState {
    pub publisher: Arc<Publisher>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(status_page))
        .route("/run", get(run_now))
        .route("/health", get(health))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .with_state(state)
}

async fn status_page(State(state): State<HttpState>) -> Response {
    let publisher = &state.publisher;
    let view = StatusView::new(
        publisher.status().await,
        publisher.is_running(),
        &publisher.adapter_names(),
    );
    match render_template(StatusTemplate { view }) {
        Ok(html) => html.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn run_now(State(state): State<HttpState>) -> Result<Response, AppError> {
    info!(target = "infra::http", "manual run requested");
    match state.publisher.trigger().await? {
        RunReport::Completed(_) => Ok("Done!".into_response()),
        RunReport::AlreadyRunning => Ok((StatusCode::CONFLICT, BUSY_MESSAGE).into_response()),
    }
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
