use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tracing::error;

use crate::application::publish::{RunStatus, RunSummary};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl IntoResponse for TemplateRenderError {
    fn into_response(self) -> Response {
        error!(
            target = "presentation::views",
            source = self.source,
            error = %self.error,
            "template rendering failed"
        );
        (StatusCode::INTERNAL_SERVER_ERROR, self.public_message).into_response()
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, TemplateRenderError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
    })
}

/// Read-only snapshot rendered on the status page.
#[derive(Debug, Clone)]
pub struct StatusView {
    pub last_ran: String,
    pub running: bool,
    pub adapters: String,
    pub summary: Option<RunSummary>,
    pub last_error: Option<String>,
}

impl StatusView {
    pub fn new(status: RunStatus, running: bool, adapters: &[&'static str]) -> Self {
        let last_ran = status
            .last_ran
            .and_then(|at| at.format(&Rfc3339).ok())
            .unwrap_or_else(|| "not yet".to_string());
        Self {
            last_ran,
            running,
            adapters: adapters.join(", "),
            summary: status.last_summary,
            last_error: status.last_error,
        }
    }
}

#[derive(Template)]
#[template(path = "status.html")]
pub struct StatusTemplate {
    pub view: StatusView,
}
