//! Reply-chain rendering for the length-constrained social destination.

use std::sync::Arc;

use tracing::{debug, warn};

use super::text::{SOCIAL_TOKENS, format_spans};
use super::thread::ThreadSplitter;
use super::types::{RenderContext, RenderError, Segment};
use super::walk::{closes_list_run, gallery_images, warn_unsupported};
use crate::application::media_upload::MediaUploader;
use crate::domain::blocks::{Block, BlockKind};

pub const DESTINATION: &str = "social";

pub struct SocialRenderer {
    uploader: Arc<dyn MediaUploader>,
    limit: usize,
    media_per_post: usize,
}

impl SocialRenderer {
    pub fn new(uploader: Arc<dyn MediaUploader>, limit: usize, media_per_post: usize) -> Self {
        Self {
            uploader,
            limit,
            media_per_post,
        }
    }

    /// Split the tree into posts at each divider. Media uploaded while a
    /// segment is open is attached to that segment.
    pub async fn render(
        &self,
        blocks: &[Block],
        ctx: &mut RenderContext,
    ) -> Result<Vec<Segment>, RenderError> {
        let mut splitter = ThreadSplitter::new(DESTINATION, self.limit);

        for (index, block) in blocks.iter().enumerate() {
            match &block.kind {
                BlockKind::Heading { text, .. }
                | BlockKind::Paragraph { text }
                | BlockKind::Callout { text, .. } => {
                    let content = format_spans(text, &SOCIAL_TOKENS);
                    let content = content.trim();
                    if !content.is_empty() {
                        splitter.push_str(content);
                        splitter.push_str("\n\n");
                    }
                }
                BlockKind::ListItem { text, .. } => {
                    splitter.push_str("* ");
                    splitter.push_str(&format_spans(text, &SOCIAL_TOKENS));
                    splitter.push_str("\n");
                    if closes_list_run(blocks, index) {
                        splitter.push_str("\n");
                    }
                }
                BlockKind::Divider => {
                    splitter.close_segment().map_err(RenderError::Validation)?;
                }
                BlockKind::Image { media, .. } => {
                    self.attach(&media.url, splitter.current_index(), ctx).await?;
                }
                BlockKind::ColumnGroup => match gallery_images(block) {
                    Some(urls) => {
                        for url in urls {
                            self.attach(url, splitter.current_index(), ctx).await?;
                        }
                    }
                    None => warn_unsupported(DESTINATION, block),
                },
                BlockKind::Audio { .. }
                | BlockKind::Code { .. }
                | BlockKind::Column
                | BlockKind::Unsupported { .. } => warn_unsupported(DESTINATION, block),
            }
        }

        let texts = splitter.finish().map_err(RenderError::Validation)?;
        Ok(texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Segment {
                text,
                media_ids: ctx.uploads_for(index),
            })
            .collect())
    }

    async fn attach(
        &self,
        url: &str,
        segment: usize,
        ctx: &mut RenderContext,
    ) -> Result<(), RenderError> {
        if ctx.uploads_for(segment).len() >= self.media_per_post {
            warn!(
                target = "application::render::social",
                segment,
                url,
                limit = self.media_per_post,
                "post already carries the maximum media count; skipping"
            );
            return Ok(());
        }

        let media_id = if ctx.is_dry_run() {
            debug!(
                target = "application::render::social",
                segment,
                url,
                "dry run; recording placeholder media id"
            );
            format!("dry-run:{url}")
        } else {
            self.uploader.upload(url).await?
        };
        ctx.record_upload(segment, media_id);
        Ok(())
    }
}
