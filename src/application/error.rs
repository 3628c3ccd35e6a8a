use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{
    application::{
        media_upload::MediaUploadError,
        publish::{AdapterError, Stage},
        render::ValidationFailure,
        sources::SourceError,
    },
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Failures at the document and adapter boundary of a publish run.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("content source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),
    #[error("{0}")]
    Validation(ValidationFailure),
    #[error("{adapter} failed during {stage}: {source}")]
    AdapterFailure {
        adapter: &'static str,
        stage: Stage,
        #[source]
        source: AdapterError,
    },
    #[error("{adapter} media upload failed: {source}")]
    MediaUploadFailure {
        adapter: &'static str,
        #[source]
        source: MediaUploadError,
    },
}

impl PublishError {
    /// Line written into the document's error annotations.
    pub fn annotation(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Publish(PublishError::SourceUnavailable(_)) => StatusCode::BAD_GATEWAY,
            AppError::Domain(DomainError::Validation { .. }) => StatusCode::BAD_REQUEST,
            AppError::Domain(DomainError::Invariant { .. })
            | AppError::Infra(_)
            | AppError::Publish(_)
            | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Publish(PublishError::SourceUnavailable(_)) => {
                "Content source temporarily unavailable"
            }
            AppError::Domain(DomainError::Validation { .. }) => "Request could not be processed",
            AppError::Infra(InfraError::Configuration { .. }) => "Service misconfigured",
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::Io(_)) => "I/O failure during request",
            AppError::Infra(InfraError::Http { .. }) => "Upstream request failed",
            AppError::Domain(DomainError::Invariant { .. })
            | AppError::Publish(_)
            | AppError::Unexpected(_) => "Unexpected error occurred",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!(
            target = "application::error::AppError",
            status = status.as_u16(),
            error = %self,
            "request failed"
        );
        (status, self.presentation_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_annotation_names_adapter_and_limit() {
        let error = PublishError::Validation(ValidationFailure::new(
            "social",
            "segment 1 is 300/280 characters",
        ));
        assert_eq!(error.annotation(), "social: segment 1 is 300/280 characters");
    }

    #[test]
    fn adapter_failure_reports_stage() {
        let error = PublishError::AdapterFailure {
            adapter: "blog",
            stage: Stage::Publish,
            source: AdapterError::Source(SourceError::NotFound),
        };
        assert_eq!(error.annotation(), "blog failed during publish: resource not found");
    }

    #[test]
    fn source_outage_maps_to_bad_gateway() {
        let error = AppError::from(PublishError::SourceUnavailable(SourceError::unavailable("down")));
        assert_eq!(error.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
