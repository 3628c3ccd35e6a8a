//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use homing::application::media_upload::{MediaUploadError, MediaUploader};
use homing::application::publish::{
    Adapter, AttachmentUploader, BlogAdapter, ForumAdapter, MarkdownAdapter, Publisher,
    RunOptions, SocialAdapter,
};
use homing::application::render::{SEGMENT_LIMIT, SocialRenderer};
use homing::application::sources::{
    BlogTarget, ContentSource, MediaMirror, ObjectStore, PropertyUpdate, PutOptions, SocialTarget,
    SourceError,
};
use homing::domain::blocks::{Block, BlockKind, MediaRef, RichText};
use homing::domain::documents::{Attachment, Document, DocumentStatus};
use time::macros::{date, datetime};
use time::{Date, OffsetDateTime};
use tokio::sync::{Mutex, Notify};

pub const NOW: OffsetDateTime = datetime!(2024-03-10 12:00 UTC);
pub const PAST: Date = date!(2024 - 03 - 01);

pub fn document(id: &str, title: &str, categories: &[&str]) -> Document {
    let mut document = Document::new(id);
    document.title = vec![RichText::plain(title)];
    document.categories = categories.iter().map(|value| value.to_string()).collect();
    document.publish_date = Some(PAST);
    document
}

pub fn paragraph(id: &str, text: &str) -> Block {
    Block::new(
        id,
        BlockKind::Paragraph {
            text: vec![RichText::plain(text)],
        },
    )
}

pub fn image(id: &str, url: &str) -> Block {
    Block::new(
        id,
        BlockKind::Image {
            media: MediaRef::new(url),
            caption: vec![],
        },
    )
}

pub fn divider(id: &str) -> Block {
    Block::new(id, BlockKind::Divider)
}

#[derive(Default)]
pub struct SourceState {
    pub documents: Vec<Document>,
    pub children: HashMap<String, Vec<Block>>,
    pub statuses: Vec<(String, DocumentStatus)>,
    pub properties: Vec<(String, PropertyUpdate)>,
    pub attachments: HashMap<String, Vec<Attachment>>,
    pub annotations: Vec<(String, String)>,
    pub broken_trees: Vec<String>,
}

/// Content source over a mutex-guarded document list.
#[derive(Default)]
pub struct MemorySource {
    pub state: Mutex<SourceState>,
    /// When set, `query_ready` parks until notified.
    pub gate: Option<Arc<Notify>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            state: Mutex::default(),
            gate: Some(gate),
        }
    }

    pub async fn add(&self, document: Document, blocks: Vec<Block>) {
        let mut state = self.state.lock().await;
        state.children.insert(document.id.clone(), blocks);
        state.documents.push(document);
    }

    pub async fn statuses(&self) -> Vec<(String, DocumentStatus)> {
        self.state.lock().await.statuses.clone()
    }

    pub async fn annotations(&self) -> Vec<(String, String)> {
        self.state.lock().await.annotations.clone()
    }

    pub async fn properties(&self) -> Vec<(String, PropertyUpdate)> {
        self.state.lock().await.properties.clone()
    }

    pub async fn released(&self, document_id: &str) -> bool {
        self.statuses()
            .await
            .iter()
            .any(|(id, status)| id == document_id && *status == DocumentStatus::Released)
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn query_ready(&self) -> Result<Vec<Document>, SourceError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let state = self.state.lock().await;
        Ok(state
            .documents
            .iter()
            .filter(|document| document.status == DocumentStatus::Ready)
            .cloned()
            .collect())
    }

    async fn fetch_children(&self, block_id: &str) -> Result<Vec<Block>, SourceError> {
        let state = self.state.lock().await;
        if state.broken_trees.iter().any(|id| id == block_id) {
            return Err(SourceError::unavailable("tree endpoint down"));
        }
        Ok(state.children.get(block_id).cloned().unwrap_or_default())
    }

    async fn update_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
    ) -> Result<(), SourceError> {
        self.state
            .lock()
            .await
            .statuses
            .push((document_id.to_string(), status));
        Ok(())
    }

    async fn update_property(
        &self,
        document_id: &str,
        update: PropertyUpdate,
    ) -> Result<(), SourceError> {
        let mut state = self.state.lock().await;
        if let PropertyUpdate::Attachments(attachments) = &update {
            state
                .attachments
                .insert(document_id.to_string(), attachments.clone());
        }
        state.properties.push((document_id.to_string(), update));
        Ok(())
    }

    async fn fetch_attachments(&self, document_id: &str) -> Result<Vec<Attachment>, SourceError> {
        let state = self.state.lock().await;
        Ok(state
            .attachments
            .get(document_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_error_annotation(
        &self,
        document_id: &str,
        message: &str,
    ) -> Result<(), SourceError> {
        self.state
            .lock()
            .await
            .annotations
            .push((document_id.to_string(), message.to_string()));
        Ok(())
    }
}

pub struct PassthroughMirror;

#[async_trait]
impl MediaMirror for PassthroughMirror {
    async fn resolve(&self, url: &str) -> Result<String, SourceError> {
        Ok(url.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub path: String,
    pub contents: String,
    pub message: String,
    pub expected_head: String,
}

#[derive(Default)]
pub struct RecordingBlog {
    pub commits: Mutex<Vec<Commit>>,
    pub reject: bool,
}

impl RecordingBlog {
    pub fn rejecting() -> Self {
        Self {
            commits: Mutex::default(),
            reject: true,
        }
    }
}

#[async_trait]
impl BlogTarget for RecordingBlog {
    async fn head_revision(&self) -> Result<String, SourceError> {
        Ok("abc123".to_string())
    }

    async fn commit_file(
        &self,
        path: &str,
        contents: &str,
        message: &str,
        expected_head: &str,
    ) -> Result<(), SourceError> {
        if self.reject {
            return Err(SourceError::Rejected {
                status: 409,
                body: "head moved".to_string(),
            });
        }
        self.commits.lock().await.push(Commit {
            path: path.to_string(),
            contents: contents.to_string(),
            message: message.to_string(),
            expected_head: expected_head.to_string(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub text: String,
    pub media_ids: Vec<String>,
    pub reply_to: Option<String>,
}

#[derive(Default)]
pub struct RecordingSocial {
    pub posts: Mutex<Vec<Post>>,
}

#[async_trait]
impl SocialTarget for RecordingSocial {
    async fn post(
        &self,
        text: &str,
        media_ids: &[String],
        reply_to: Option<&str>,
    ) -> Result<String, SourceError> {
        let mut posts = self.posts.lock().await;
        posts.push(Post {
            text: text.to_string(),
            media_ids: media_ids.to_vec(),
            reply_to: reply_to.map(str::to_string),
        });
        Ok(format!("post-{}", posts.len()))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, (Bytes, String, PutOptions)>>,
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, SourceError> {
        Ok(self.objects.lock().await.contains_key(key))
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        options: PutOptions,
    ) -> Result<String, SourceError> {
        let mut objects = self.objects.lock().await;
        if options.overwrite || !objects.contains_key(key) {
            objects.insert(key.to_string(), (data, content_type.to_string(), options));
        }
        Ok(self.public_url(key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://store.test/{key}")
    }
}

#[derive(Default)]
pub struct CountingUploader {
    pub uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaUploader for CountingUploader {
    async fn upload(&self, url: &str) -> Result<String, MediaUploadError> {
        let mut uploads = self.uploads.lock().await;
        uploads.push(url.to_string());
        Ok(format!("media-{}", uploads.len()))
    }
}

/// Every collaborator a full publisher needs, kept around for assertions.
pub struct Harness {
    pub source: Arc<MemorySource>,
    pub blog: Arc<RecordingBlog>,
    pub social: Arc<RecordingSocial>,
    pub store: Arc<MemoryStore>,
    pub uploader: Arc<CountingUploader>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_parts(Arc::new(MemorySource::new()), Arc::new(RecordingBlog::default()))
    }

    pub fn with_parts(source: Arc<MemorySource>, blog: Arc<RecordingBlog>) -> Self {
        Self {
            source,
            blog,
            social: Arc::new(RecordingSocial::default()),
            store: Arc::new(MemoryStore::default()),
            uploader: Arc::new(CountingUploader::default()),
        }
    }

    pub fn adapters(&self) -> Vec<Arc<dyn Adapter>> {
        let renderer = SocialRenderer::new(self.uploader.clone(), SEGMENT_LIMIT, 4);
        vec![
            Arc::new(BlogAdapter::new(self.blog.clone(), "content/blog")),
            Arc::new(SocialAdapter::new(
                renderer,
                self.social.clone(),
                time::Duration::days(1),
            )),
            Arc::new(ForumAdapter::new(AttachmentUploader::new(
                self.store.clone(),
                "attachments",
            ))),
            Arc::new(MarkdownAdapter::new(AttachmentUploader::new(
                self.store.clone(),
                "attachments",
            ))),
        ]
    }

    pub fn publisher(&self, options: RunOptions) -> Publisher {
        Publisher::new(
            self.source.clone(),
            Arc::new(PassthroughMirror),
            self.adapters(),
            options,
        )
    }

    pub fn live(&self) -> Publisher {
        self.publisher(RunOptions {
            dry_run: None,
            mark_released: true,
        })
    }
}
