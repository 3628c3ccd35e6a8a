//! Collaborator traits describing the content source and publish targets.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use time::Date;

use crate::domain::blocks::Block;
use crate::domain::documents::{Attachment, Document, DocumentStatus};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("resource not found")]
    NotFound,
    #[error("unexpected response: {message}")]
    InvalidResponse { message: String },
    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl SourceError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::invalid_response(err.to_string())
        } else {
            Self::unavailable(err)
        }
    }
}

/// Property writes a destination may persist back to the content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyUpdate {
    PublishDate(Date),
    Attachments(Vec<Attachment>),
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Documents whose status is ready, in source order.
    async fn query_ready(&self) -> Result<Vec<Document>, SourceError>;

    /// Direct children of a block (or document root), in document order.
    async fn fetch_children(&self, block_id: &str) -> Result<Vec<Block>, SourceError>;

    async fn update_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
    ) -> Result<(), SourceError>;

    async fn update_property(
        &self,
        document_id: &str,
        update: PropertyUpdate,
    ) -> Result<(), SourceError>;

    /// Current attachment list, re-read from the source.
    async fn fetch_attachments(&self, document_id: &str) -> Result<Vec<Attachment>, SourceError>;

    async fn append_error_annotation(
        &self,
        document_id: &str,
        message: &str,
    ) -> Result<(), SourceError>;
}

/// Copies externally hosted assets into long-lived public storage.
#[async_trait]
pub trait MediaMirror: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<String, SourceError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Short-lived object; stores may expire it.
    pub temporary: bool,
    /// Replace an existing object with the same key.
    pub overwrite: bool,
}

/// Keyed blob storage with public URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, SourceError>;

    /// Store `data` under `key` unless it exists and `overwrite` is unset.
    /// Returns the public URL either way.
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        options: PutOptions,
    ) -> Result<String, SourceError>;

    fn public_url(&self, key: &str) -> String;
}

/// Commit-based long-form article target.
#[async_trait]
pub trait BlogTarget: Send + Sync {
    /// Current branch tip revision.
    async fn head_revision(&self) -> Result<String, SourceError>;

    /// Add or replace `path` in a commit whose expected parent is `expected_head`.
    async fn commit_file(
        &self,
        path: &str,
        contents: &str,
        message: &str,
        expected_head: &str,
    ) -> Result<(), SourceError>;
}

/// Length-constrained social network target.
#[async_trait]
pub trait SocialTarget: Send + Sync {
    async fn post(
        &self,
        text: &str,
        media_ids: &[String],
        reply_to: Option<&str>,
    ) -> Result<String, SourceError>;
}
