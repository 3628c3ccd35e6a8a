use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::adapter::{Adapter, AdapterError, DocumentRun};
use crate::application::render::{Artifact, BlogRenderer, RenderContext};
use crate::application::sources::BlogTarget;
use crate::domain::error::DomainError;

/// Publishes articles as markdown files committed to the site repository.
pub struct BlogAdapter {
    target: Arc<dyn BlogTarget>,
    content_prefix: String,
}

impl BlogAdapter {
    pub fn new(target: Arc<dyn BlogTarget>, content_prefix: impl Into<String>) -> Self {
        Self {
            target,
            content_prefix: content_prefix.into(),
        }
    }

    pub fn content_path(&self, slug: &str) -> String {
        let prefix = self.content_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            format!("{slug}/index.md")
        } else {
            format!("{prefix}/{slug}/index.md")
        }
    }
}

#[async_trait]
impl Adapter for BlogAdapter {
    fn name(&self) -> &'static str {
        "blog"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["blog", "devlog"]
    }

    fn extension(&self) -> &'static str {
        "md"
    }

    async fn render(
        &self,
        run: &DocumentRun<'_>,
        ctx: &mut RenderContext,
    ) -> Result<Option<Artifact>, AdapterError> {
        if run.document.publish_date.is_none() {
            return Err(DomainError::invariant("article has no publish date").into());
        }
        let text = BlogRenderer.render(&run.document, run.tree, ctx).await?;
        Ok(Some(Artifact::Text(text)))
    }

    async fn publish(&self, run: &DocumentRun<'_>, artifact: &Artifact) -> Result<(), AdapterError> {
        let Artifact::Text(contents) = artifact else {
            return Err(AdapterError::UnexpectedArtifact);
        };

        let slug = run.slug()?;
        let path = self.content_path(&slug);
        let head = self.target.head_revision().await?;

        debug!(
            target = "application::publish::blog",
            slug = %slug,
            head = %head,
            "committing article"
        );

        self.target
            .commit_file(&path, contents, &format!("Wrote/updated {slug}"), &head)
            .await?;
        Ok(())
    }
}
