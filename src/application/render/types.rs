use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;

use crate::application::media_upload::MediaUploadError;
use crate::application::sources::{MediaMirror, SourceError};

/// A rendered artifact violated a destination constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub adapter: &'static str,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(adapter: &'static str, message: impl Into<String>) -> Self {
        Self {
            adapter,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.adapter, self.message)
    }
}

/// Structured errors surfaced by the destination renderers.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("media mirror failed: {0}")]
    Source(#[source] SourceError),
    #[error(transparent)]
    Media(#[from] MediaUploadError),
    #[error("{0}")]
    Validation(ValidationFailure),
}

/// One post of a reply chain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Segment {
    pub text: String,
    pub media_ids: Vec<String>,
}

/// Output of a destination renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Artifact {
    Text(String),
    Thread(Vec<Segment>),
}

impl Artifact {
    /// Flatten the artifact for local inspection.
    pub fn to_text(&self) -> String {
        match self {
            Artifact::Text(text) => text.clone(),
            Artifact::Thread(segments) => segments
                .iter()
                .map(|segment| segment.text.as_str())
                .collect::<Vec<_>>()
                .join("\n---\n"),
        }
    }
}

/// Run-scoped media resolution with a URL cache shared by every document of the run.
pub struct RunMedia {
    mirror: Arc<dyn MediaMirror>,
    cache: DashMap<String, String>,
}

impl RunMedia {
    pub fn new(mirror: Arc<dyn MediaMirror>) -> Self {
        Self {
            mirror,
            cache: DashMap::new(),
        }
    }

    pub async fn resolve(&self, url: &str) -> Result<String, SourceError> {
        if let Some(hit) = self.cache.get(url) {
            return Ok(hit.value().clone());
        }

        let resolved = self.mirror.resolve(url).await?;
        self.cache.insert(url.to_string(), resolved.clone());
        Ok(resolved)
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// Media uploaded while rendering a given thread segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMedia {
    pub segment: usize,
    pub media_id: String,
}

/// Per-document mutable render state, owned by the orchestrator.
pub struct RenderContext {
    media: Arc<RunMedia>,
    uploads: Vec<SegmentMedia>,
    failures: Vec<ValidationFailure>,
    dry_run: bool,
}

impl RenderContext {
    pub fn new(media: Arc<RunMedia>) -> Self {
        Self {
            media,
            uploads: Vec::new(),
            failures: Vec::new(),
            dry_run: false,
        }
    }

    /// Renderers skip remote side effects (media uploads) on a dry-run context.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub async fn resolve_media(&self, url: &str) -> Result<String, RenderError> {
        self.media.resolve(url).await.map_err(RenderError::Source)
    }

    pub fn record_upload(&mut self, segment: usize, media_id: String) {
        self.uploads.push(SegmentMedia { segment, media_id });
    }

    /// Media ids attached to `segment`, in upload order.
    pub fn uploads_for(&self, segment: usize) -> Vec<String> {
        self.uploads
            .iter()
            .filter(|upload| upload.segment == segment)
            .map(|upload| upload.media_id.clone())
            .collect()
    }

    pub fn flag(&mut self, failure: ValidationFailure) {
        self.failures.push(failure);
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    pub fn take_failures(&mut self) -> Vec<ValidationFailure> {
        std::mem::take(&mut self.failures)
    }
}
