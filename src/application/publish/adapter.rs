//! Destination adapter contract and per-document run state.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use time::{Date, OffsetDateTime};

use crate::application::render::{Artifact, RenderContext, RenderError};
use crate::application::sources::{ContentSource, PropertyUpdate, SourceError};
use crate::domain::blocks::{Block, plain_text};
use crate::domain::documents::{Attachment, Document};
use crate::domain::error::DomainError;
use crate::domain::slug::{SlugError, derive_slug};

/// Lifecycle stage an adapter is in, reported with failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preflight,
    Render,
    Publish,
    DryRun,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Preflight => "preflight",
            Stage::Render => "render",
            Stage::Publish => "publish",
            Stage::DryRun => "dry_run",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("cannot derive slug: {0}")]
    Slug(#[from] SlugError),
    #[error("artifact is not supported by this destination")]
    UnexpectedArtifact,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Release timing of a document at the start of its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    pub has_release_time: bool,
    pub can_be_released: bool,
}

impl Eligibility {
    pub fn evaluate(document: &Document, now: OffsetDateTime) -> Self {
        Self {
            has_release_time: document.publish_date.is_some(),
            can_be_released: document.can_be_released(now),
        }
    }
}

/// Property writes adapters are allowed to make. Status transitions stay with
/// the orchestrator.
#[derive(Clone, Copy)]
pub struct PropertyWriter<'a> {
    source: &'a dyn ContentSource,
    document_id: &'a str,
}

impl<'a> PropertyWriter<'a> {
    pub fn new(source: &'a dyn ContentSource, document_id: &'a str) -> Self {
        Self {
            source,
            document_id,
        }
    }

    pub async fn set_publish_date(&self, date: Date) -> Result<(), SourceError> {
        self.source
            .update_property(self.document_id, PropertyUpdate::PublishDate(date))
            .await
    }

    pub async fn attachments(&self) -> Result<Vec<Attachment>, SourceError> {
        self.source.fetch_attachments(self.document_id).await
    }

    pub async fn set_attachments(&self, attachments: Vec<Attachment>) -> Result<(), SourceError> {
        self.source
            .update_property(self.document_id, PropertyUpdate::Attachments(attachments))
            .await
    }
}

/// Everything an adapter may look at while processing one document.
pub struct DocumentRun<'a> {
    pub document: Document,
    pub tree: &'a [Block],
    pub eligibility: Eligibility,
    /// Every ready document of this run, including this one.
    pub ready: &'a [Document],
    pub now: OffsetDateTime,
    pub properties: PropertyWriter<'a>,
    /// Set when artifacts go to disk; adapters must not write back to the source.
    pub dry_run: bool,
}

impl<'a> DocumentRun<'a> {
    pub fn new(
        document: Document,
        tree: &'a [Block],
        ready: &'a [Document],
        properties: PropertyWriter<'a>,
        now: OffsetDateTime,
    ) -> Self {
        let eligibility = Eligibility::evaluate(&document, now);
        Self {
            document,
            tree,
            eligibility,
            ready,
            now,
            properties,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn slug(&self) -> Result<String, SlugError> {
        derive_slug(&plain_text(&self.document.title))
    }

    pub fn refresh_eligibility(&mut self) {
        self.eligibility = Eligibility::evaluate(&self.document, self.now);
    }

    /// Default readiness check: no open error annotations and a publish date in the past.
    pub fn is_releasable(&self) -> bool {
        !self.document.has_errors() && self.eligibility.can_be_released
    }
}

#[async_trait]
pub trait Adapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Document categories this adapter applies to.
    fn tags(&self) -> &'static [&'static str];

    /// File extension used for dry-run output.
    fn extension(&self) -> &'static str;

    async fn preflight(&self, run: &mut DocumentRun<'_>) -> Result<bool, AdapterError> {
        Ok(run.is_releasable())
    }

    /// `Ok(None)` means "do not publish"; any validation failure is recorded on `ctx`.
    async fn render(
        &self,
        run: &DocumentRun<'_>,
        ctx: &mut RenderContext,
    ) -> Result<Option<Artifact>, AdapterError>;

    async fn publish(&self, run: &DocumentRun<'_>, artifact: &Artifact) -> Result<(), AdapterError>;

    fn applies_to(&self, document: &Document) -> bool {
        self.tags().iter().any(|tag| document.has_category(tag))
    }
}
