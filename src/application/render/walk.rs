//! Block traversal shared by the text destinations.

use tracing::warn;

use super::text::{TokenTable, format_spans};
use super::types::{RenderContext, RenderError};
use crate::domain::blocks::{Block, BlockKind, BlockVariant, RichText, plain_text};

/// Whether `blocks[index]` is the last item of a run of same-variant siblings.
/// A missing next sibling closes the run.
pub fn closes_list_run(blocks: &[Block], index: usize) -> bool {
    match (blocks.get(index), blocks.get(index + 1)) {
        (Some(current), Some(next)) => current.variant() != next.variant(),
        _ => true,
    }
}

/// Image URLs of a column group when every grandchild is an image, in document
/// order. Any other shape (no columns, empty columns, a non-image grandchild)
/// yields `None`.
pub fn gallery_images(group: &Block) -> Option<Vec<&str>> {
    if !group.has_children || group.children.is_empty() {
        return None;
    }

    let mut urls = Vec::new();
    for column in &group.children {
        for grandchild in &column.children {
            match &grandchild.kind {
                BlockKind::Image { media, .. } => urls.push(media.url.as_str()),
                _ => return None,
            }
        }
    }

    if urls.is_empty() { None } else { Some(urls) }
}

pub(crate) fn warn_unsupported(destination: &'static str, block: &Block) {
    warn!(
        target = "application::render",
        destination,
        block_id = %block.id,
        block_type = block.kind.name(),
        "skipping unsupported block"
    );
}

/// Markup policy of one text destination. The walker handles traversal, media
/// resolution, paragraph trimming and list runs; a dialect only supplies the
/// fragments.
pub trait Dialect: Sync {
    fn name(&self) -> &'static str;

    fn tokens(&self) -> &TokenTable;

    /// Variants this destination can express. Anything else is logged and skipped.
    fn supports(&self, variant: BlockVariant) -> bool;

    fn heading(&self, level: u8, text: &str) -> String;

    fn list_item(&self, text: &str) -> String {
        format!("* {text}\n")
    }

    fn image(&self, url: &str, caption: &str) -> String;

    fn audio(&self, _url: &str) -> String {
        String::new()
    }

    fn code(&self, language: &str, code: &str) -> String;

    fn callout(&self, icon: Option<&str>, text: &str) -> String;

    fn gallery(&self, urls: &[String]) -> String;

    fn format(&self, spans: &[RichText]) -> String {
        format_spans(spans, self.tokens())
    }
}

/// Render `blocks` with `dialect`, appending to `buffer`.
pub async fn render_blocks<D>(
    dialect: &D,
    blocks: &[Block],
    ctx: &mut RenderContext,
    buffer: &mut String,
) -> Result<(), RenderError>
where
    D: Dialect + ?Sized,
{
    for (index, block) in blocks.iter().enumerate() {
        let variant = block.variant();
        if !dialect.supports(variant) {
            warn_unsupported(dialect.name(), block);
            continue;
        }

        match &block.kind {
            BlockKind::Heading { level, text } => {
                buffer.push_str(&dialect.heading(*level, &dialect.format(text)));
            }
            BlockKind::Paragraph { text } => {
                let content = dialect.format(text);
                let content = content.trim();
                if !content.is_empty() {
                    buffer.push_str(content);
                    buffer.push_str("\n\n");
                }
            }
            BlockKind::ListItem { text, .. } => {
                buffer.push_str(&dialect.list_item(&dialect.format(text)));
                if closes_list_run(blocks, index) {
                    buffer.push('\n');
                }
            }
            BlockKind::Image { media, caption } => {
                let url = ctx.resolve_media(&media.url).await?;
                buffer.push_str(&dialect.image(&url, &dialect.format(caption)));
            }
            BlockKind::Audio { media } => {
                let url = ctx.resolve_media(&media.url).await?;
                buffer.push_str(&dialect.audio(&url));
            }
            BlockKind::Code { language, text } => {
                buffer.push_str(&dialect.code(language, &plain_text(text)));
            }
            BlockKind::Callout { icon, text } => {
                buffer.push_str(&dialect.callout(icon.as_deref(), &dialect.format(text)));
            }
            BlockKind::ColumnGroup => match gallery_images(block) {
                Some(sources) => {
                    let mut urls = Vec::with_capacity(sources.len());
                    for source in sources {
                        urls.push(ctx.resolve_media(source).await?);
                    }
                    buffer.push_str(&dialect.gallery(&urls));
                }
                None => warn_unsupported(dialect.name(), block),
            },
            BlockKind::Divider | BlockKind::Column | BlockKind::Unsupported { .. } => {
                warn_unsupported(dialect.name(), block);
            }
        }
    }

    Ok(())
}
