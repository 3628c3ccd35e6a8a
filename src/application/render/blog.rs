//! Long-form article markup: YAML front matter, shortcodes and inline HTML.

use std::fmt::Write as _;

use super::text::{MARKDOWN_TOKENS, TokenTable, format_spans};
use super::types::{RenderContext, RenderError};
use super::walk::{Dialect, render_blocks};
use crate::domain::blocks::{Block, BlockVariant};
use crate::domain::documents::Document;

pub const CLOSING_MARKER: &str = "{{<goodbye>}}";

#[derive(Debug, Clone, Copy, Default)]
pub struct BlogRenderer;

impl BlogRenderer {
    pub async fn render(
        &self,
        document: &Document,
        blocks: &[Block],
        ctx: &mut RenderContext,
    ) -> Result<String, RenderError> {
        let mut buffer = self.front_matter(document, ctx).await?;
        render_blocks(self, blocks, ctx, &mut buffer).await?;
        buffer.push_str("\n\n");
        buffer.push_str(CLOSING_MARKER);
        Ok(buffer)
    }

    async fn front_matter(
        &self,
        document: &Document,
        ctx: &mut RenderContext,
    ) -> Result<String, RenderError> {
        let cover = match document.cover.as_deref() {
            Some(url) => ctx.resolve_media(url).await?,
            None => String::new(),
        };
        let date = document
            .publish_date
            .map(|date| date.to_string())
            .unwrap_or_default();

        let mut header = String::from("---\n");
        let _ = writeln!(header, "title: \"{}\"", quoted(&format_spans(&document.title, &MARKDOWN_TOKENS)));
        let _ = writeln!(
            header,
            "subtitle: \"{}\"",
            quoted(&format_spans(&document.subtitle, &MARKDOWN_TOKENS))
        );
        let _ = writeln!(header, "date: {date}T00:00:00+01:00");
        header.push_str("object_position: center\n");
        let _ = writeln!(header, "tags: [{}]", document.tags.join(","));
        header.push_str("cover:\n");
        let _ = writeln!(header, "    image: \"{cover}\"");
        header.push_str("---\n");
        Ok(header)
    }
}

fn quoted(value: &str) -> String {
    value.replace('"', "\\\"")
}

impl Dialect for BlogRenderer {
    fn name(&self) -> &'static str {
        "blog"
    }

    fn tokens(&self) -> &TokenTable {
        &MARKDOWN_TOKENS
    }

    fn supports(&self, variant: BlockVariant) -> bool {
        !matches!(
            variant,
            BlockVariant::Divider | BlockVariant::Column | BlockVariant::Unsupported
        )
    }

    fn heading(&self, level: u8, text: &str) -> String {
        format!("{} {text}\n\n", "#".repeat(usize::from(level.max(1))))
    }

    fn image(&self, url: &str, caption: &str) -> String {
        let mut out = format!(
            "\n<center><img style=\"flex: 1; margin: 0px 8px; margin-bottom: 8px\" src=\"{url}\" />"
        );
        if !caption.is_empty() {
            let _ = write!(out, "<span>{caption}</span>\n\n");
        }
        out.push_str("</center>\n\n");
        out
    }

    fn audio(&self, url: &str) -> String {
        format!("<audio controls><source src=\"{url}\"></audio><br/>\n\n")
    }

    fn code(&self, language: &str, code: &str) -> String {
        format!("{{{{< highlight {language} >}}}}\n{code}\n{{{{< / highlight >}}}}\n\n")
    }

    fn callout(&self, icon: Option<&str>, text: &str) -> String {
        match icon {
            Some(icon) => format!("> {icon} {text}\n\n"),
            None => format!("> {text}\n\n"),
        }
    }

    fn gallery(&self, urls: &[String]) -> String {
        let mut out = String::from("<center style=\"display: flex;\">\n");
        for url in urls {
            let _ = writeln!(out, "<img style=\"flex: 1; margin: 0px 8px\" src=\"{url}\" />");
        }
        out.push_str("</center>\n\n");
        out
    }
}
