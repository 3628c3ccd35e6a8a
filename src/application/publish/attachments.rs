//! Destinations whose artifact is uploaded and linked as a document attachment.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::adapter::{Adapter, AdapterError, DocumentRun};
use crate::application::render::{Artifact, ForumRenderer, MarkdownRenderer, RenderContext};
use crate::application::sources::{ObjectStore, PutOptions};
use crate::domain::documents::{Attachment, replace_attachment};

/// Uploads text artifacts into the attachment area of the object store.
#[derive(Clone)]
pub struct AttachmentUploader {
    store: Arc<dyn ObjectStore>,
    directory: String,
}

impl AttachmentUploader {
    pub fn new(store: Arc<dyn ObjectStore>, directory: impl Into<String>) -> Self {
        Self {
            store,
            directory: directory.into(),
        }
    }

    fn key(&self, file_name: &str) -> String {
        let directory = self.directory.trim_matches('/');
        if directory.is_empty() {
            file_name.to_string()
        } else {
            format!("{directory}/{file_name}")
        }
    }

    /// Upload `contents` as `file_name` and swap it into the document's
    /// attachment list under `display_name`.
    pub async fn attach(
        &self,
        run: &DocumentRun<'_>,
        file_name: &str,
        display_name: &str,
        contents: &str,
    ) -> Result<(), AdapterError> {
        let key = self.key(file_name);
        debug!(
            target = "application::publish::attachments",
            document_id = %run.document.id,
            key = %key,
            "uploading temporary attachment"
        );

        let url = self
            .store
            .put(
                &key,
                Bytes::copy_from_slice(contents.as_bytes()),
                "text/plain; charset=utf-8",
                PutOptions {
                    temporary: true,
                    overwrite: true,
                },
            )
            .await?;

        let current = run.properties.attachments().await?;
        let updated = replace_attachment(
            &current,
            Attachment {
                name: display_name.to_string(),
                url,
            },
        );
        run.properties.set_attachments(updated).await?;
        Ok(())
    }
}

fn text_of(artifact: &Artifact) -> Result<&str, AdapterError> {
    match artifact {
        Artifact::Text(text) => Ok(text),
        Artifact::Thread(_) => Err(AdapterError::UnexpectedArtifact),
    }
}

pub const FORUM_ATTACHMENT: &str = "BBCode for forums";
pub const MARKDOWN_ATTACHMENT: &str = "Markdown file";

pub struct ForumAdapter {
    uploader: AttachmentUploader,
}

impl ForumAdapter {
    pub fn new(uploader: AttachmentUploader) -> Self {
        Self { uploader }
    }
}

#[async_trait]
impl Adapter for ForumAdapter {
    fn name(&self) -> &'static str {
        "forum"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["devlog"]
    }

    fn extension(&self) -> &'static str {
        "bbcode.txt"
    }

    async fn render(
        &self,
        run: &DocumentRun<'_>,
        ctx: &mut RenderContext,
    ) -> Result<Option<Artifact>, AdapterError> {
        let text = ForumRenderer.render(&run.document, run.tree, ctx).await?;
        Ok(Some(Artifact::Text(text)))
    }

    async fn publish(&self, run: &DocumentRun<'_>, artifact: &Artifact) -> Result<(), AdapterError> {
        let file_name = format!("{}.{}", run.slug()?, self.extension());
        self.uploader
            .attach(run, &file_name, FORUM_ATTACHMENT, text_of(artifact)?)
            .await
    }
}

pub struct MarkdownAdapter {
    uploader: AttachmentUploader,
}

impl MarkdownAdapter {
    pub fn new(uploader: AttachmentUploader) -> Self {
        Self { uploader }
    }
}

#[async_trait]
impl Adapter for MarkdownAdapter {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["devlog"]
    }

    fn extension(&self) -> &'static str {
        "md.txt"
    }

    async fn render(
        &self,
        run: &DocumentRun<'_>,
        ctx: &mut RenderContext,
    ) -> Result<Option<Artifact>, AdapterError> {
        let text = MarkdownRenderer.render(run.tree, ctx).await?;
        Ok(Some(Artifact::Text(text)))
    }

    async fn publish(&self, run: &DocumentRun<'_>, artifact: &Artifact) -> Result<(), AdapterError> {
        let file_name = format!("{}.{}", run.slug()?, self.extension());
        self.uploader
            .attach(run, &file_name, MARKDOWN_ATTACHMENT, text_of(artifact)?)
            .await
    }
}
