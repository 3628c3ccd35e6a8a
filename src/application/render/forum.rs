//! BBCode markup for forum devlog threads.

use std::fmt::Write as _;

use super::text::{BBCODE_TOKENS, TokenTable};
use super::types::{RenderContext, RenderError};
use super::walk::{Dialect, render_blocks};
use crate::domain::blocks::{Block, BlockVariant};
use crate::domain::documents::Document;

#[derive(Debug, Clone, Copy, Default)]
pub struct ForumRenderer;

impl ForumRenderer {
    pub async fn render(
        &self,
        document: &Document,
        blocks: &[Block],
        ctx: &mut RenderContext,
    ) -> Result<String, RenderError> {
        let mut buffer = match document.cover.as_deref() {
            Some(cover) => {
                let url = ctx.resolve_media(cover).await?;
                format!("[center][img width=750]{url}[/img][/center]\n")
            }
            None => String::new(),
        };
        render_blocks(self, blocks, ctx, &mut buffer).await?;
        Ok(buffer)
    }
}

impl Dialect for ForumRenderer {
    fn name(&self) -> &'static str {
        "forum"
    }

    fn tokens(&self) -> &TokenTable {
        &BBCODE_TOKENS
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

    fn heading(&self, _level: u8, text: &str) -> String {
        format!("[b]{text}[/b]\n\n")
    }

    fn image(&self, url: &str, caption: &str) -> String {
        if caption.is_empty() {
            format!("\n[center][img]{url}[/img][/center]\n\n")
        } else {
            format!("\n[center][img]{url}[/img]\n{caption}[/center]\n\n")
        }
    }

    fn code(&self, _language: &str, code: &str) -> String {
        format!("[code]{code}[/code]\n\n")
    }

    fn callout(&self, icon: Option<&str>, text: &str) -> String {
        match icon {
            Some(icon) => format!("[quote]{icon} {text}[/quote]\n\n"),
            None => format!("[quote]{text}[/quote]\n\n"),
        }
    }

    fn gallery(&self, urls: &[String]) -> String {
        let mut out = String::from("[center][table]");
        for url in urls {
            let _ = writeln!(out, "[td][img]{url}[/img][/td]");
        }
        out.push_str("[/table][/center]\n\n");
        out
    }
}
