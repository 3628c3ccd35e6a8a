//! Plain markdown export.

use super::text::{MARKDOWN_TOKENS, TokenTable};
use super::types::{RenderContext, RenderError};
use super::walk::{Dialect, render_blocks};
use crate::domain::blocks::{Block, BlockVariant};

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub async fn render(
        &self,
        blocks: &[Block],
        ctx: &mut RenderContext,
    ) -> Result<String, RenderError> {
        let mut buffer = String::new();
        render_blocks(self, blocks, ctx, &mut buffer).await?;
        Ok(buffer)
    }
}

impl Dialect for MarkdownRenderer {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn tokens(&self) -> &TokenTable {
        &MARKDOWN_TOKENS
    }

    fn supports(&self, variant: BlockVariant) -> bool {
        !matches!(
            variant,
            BlockVariant::Audio
                | BlockVariant::Divider
                | BlockVariant::Column
                | BlockVariant::Unsupported
        )
    }

    fn heading(&self, level: u8, text: &str) -> String {
        format!("{} {text}\n\n", "#".repeat(usize::from(level.max(1))))
    }

    fn image(&self, url: &str, caption: &str) -> String {
        format!("\n![{caption}]({url}) \n\n")
    }

    fn code(&self, language: &str, code: &str) -> String {
        format!("```{language}\n{code}\n```\n\n")
    }

    fn callout(&self, icon: Option<&str>, text: &str) -> String {
        match icon {
            Some(icon) => format!("> {icon} {text}\n\n"),
            None => format!("> {text}\n\n"),
        }
    }

    fn gallery(&self, urls: &[String]) -> String {
        urls.iter().map(|url| self.image(url, "")).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::application::render::types::RunMedia;
    use crate::application::sources::{MediaMirror, SourceError};
    use crate::domain::blocks::{BlockKind, ListStyle, MediaRef, RichText};

    struct Passthrough;

    #[async_trait]
    impl MediaMirror for Passthrough {
        async fn resolve(&self, url: &str) -> Result<String, SourceError> {
            Ok(url.to_string())
        }
    }

    fn context() -> RenderContext {
        RenderContext::new(Arc::new(RunMedia::new(Arc::new(Passthrough))))
    }

    fn item(id: &str, style: ListStyle) -> Block {
        Block::new(
            id,
            BlockKind::ListItem {
                style,
                text: vec![RichText::plain(id)],
            },
        )
    }

    #[tokio::test]
    async fn list_grouping_follows_sibling_variants() {
        let blocks = [
            item("a", ListStyle::Unordered),
            item("b", ListStyle::Unordered),
            item("c", ListStyle::Unordered),
            item("1", ListStyle::Ordered),
        ];

        let output = MarkdownRenderer
            .render(&blocks, &mut context())
            .await
            .expect("render");

        assert_eq!(output, "* a\n* b\n* c\n\n* 1\n\n");
    }

    #[tokio::test]
    async fn mixed_column_group_is_dropped() {
        let group = Block::new("cols", BlockKind::ColumnGroup).with_children(vec![
            Block::new("c1", BlockKind::Column).with_children(vec![Block::new(
                "img",
                BlockKind::Image {
                    media: MediaRef::new("https://cdn/a.png"),
                    caption: vec![],
                },
            )]),
            Block::new("c2", BlockKind::Column).with_children(vec![Block::new(
                "p",
                BlockKind::Paragraph {
                    text: vec![RichText::plain("text")],
                },
            )]),
        ]);

        let output = MarkdownRenderer
            .render(&[group], &mut context())
            .await
            .expect("render");

        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn code_is_fenced_with_language() {
        let blocks = [Block::new(
            "code",
            BlockKind::Code {
                language: "gdscript".to_string(),
                text: vec![RichText::plain("func _ready():\n\tpass")],
            },
        )];

        let output = MarkdownRenderer
            .render(&blocks, &mut context())
            .await
            .expect("render");

        assert_eq!(output, "```gdscript\nfunc _ready():\n\tpass\n```\n\n");
    }
}
