//! Inline rich-text formatting shared by every destination.

use crate::domain::blocks::{Annotation, RichText};

type Markers = Option<(&'static str, &'static str)>;

/// Destination markup for annotations and links. A `None` marker means the
/// destination does not support that annotation and leaves the text bare.
#[derive(Debug, Clone, Copy)]
pub struct TokenTable {
    pub bold: Markers,
    pub italic: Markers,
    pub code: Markers,
    pub strikethrough: Markers,
    pub underline: Markers,
    /// Wraps `(content, url)` into a link; `None` drops link targets.
    pub link: Option<fn(&str, &str) -> String>,
}

impl TokenTable {
    pub fn markers(&self, kind: Annotation) -> Markers {
        match kind {
            Annotation::Bold => self.bold,
            Annotation::Italic => self.italic,
            Annotation::Code => self.code,
            Annotation::Strikethrough => self.strikethrough,
            Annotation::Underline => self.underline,
        }
    }
}

fn markdown_link(content: &str, url: &str) -> String {
    format!("[{content}]({url})")
}

fn bbcode_link(content: &str, url: &str) -> String {
    format!("[url={url}]{content}[/url]")
}

/// Markdown flavour used by the blog and plain markdown destinations.
pub const MARKDOWN_TOKENS: TokenTable = TokenTable {
    bold: Some(("*", "*")),
    italic: Some(("_", "_")),
    code: Some(("`", "`")),
    strikethrough: Some(("~", "~")),
    underline: None,
    link: Some(markdown_link),
};

pub const BBCODE_TOKENS: TokenTable = TokenTable {
    bold: Some(("[b]", "[/b]")),
    italic: Some(("[i]", "[/i]")),
    code: Some(("[code]", "[/code]")),
    strikethrough: Some(("[s]", "[/s]")),
    underline: Some(("[u]", "[/u]")),
    link: Some(bbcode_link),
};

/// Social posts keep the markdown-ish emphasis but carry no link markup.
pub const SOCIAL_TOKENS: TokenTable = TokenTable {
    link: None,
    ..MARKDOWN_TOKENS
};

/// Render one span: link-wrap first, then each supported annotation in
/// [`Annotation::ORDER`], so later kinds end up outermost.
pub fn format_span(span: &RichText, tokens: &TokenTable) -> String {
    let mut buffer = match (span.link.as_deref(), tokens.link) {
        (Some(url), Some(wrap)) => wrap(&span.content, url),
        _ => span.content.clone(),
    };

    for kind in Annotation::ORDER {
        if !span.has(kind) {
            continue;
        }
        if let Some((open, close)) = tokens.markers(kind) {
            buffer = format!("{open}{buffer}{close}");
        }
    }

    buffer
}

pub fn format_spans(spans: &[RichText], tokens: &TokenTable) -> String {
    spans.iter().map(|span| format_span(span, tokens)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_is_wrapped_before_annotations() {
        let span = RichText::plain("docs")
            .with_link("https://example.com")
            .with(Annotation::Strikethrough)
            .with(Annotation::Bold);

        assert_eq!(
            format_span(&span, &MARKDOWN_TOKENS),
            "~*[docs](https://example.com)*~"
        );
        assert_eq!(
            format_span(&span, &BBCODE_TOKENS),
            "[s][b][url=https://example.com]docs[/url][/b][/s]"
        );
    }

    #[test]
    fn annotation_input_order_does_not_matter() {
        let forward = RichText::plain("x")
            .with(Annotation::Bold)
            .with(Annotation::Italic);
        let reverse = RichText::plain("x")
            .with(Annotation::Italic)
            .with(Annotation::Bold);

        assert_eq!(format_span(&forward, &MARKDOWN_TOKENS), "_*x*_");
        assert_eq!(
            format_span(&forward, &MARKDOWN_TOKENS),
            format_span(&reverse, &MARKDOWN_TOKENS)
        );
    }

    #[test]
    fn unsupported_annotations_are_ignored() {
        let span = RichText::plain("under").with(Annotation::Underline);
        assert_eq!(format_span(&span, &MARKDOWN_TOKENS), "under");
        assert_eq!(format_span(&span, &BBCODE_TOKENS), "[u]under[/u]");
    }

    #[test]
    fn social_tokens_drop_links() {
        let span = RichText::plain("site")
            .with_link("https://example.com")
            .with(Annotation::Code);
        assert_eq!(format_span(&span, &SOCIAL_TOKENS), "`site`");
    }

    #[test]
    fn spans_are_concatenated_in_order() {
        let spans = vec![
            RichText::plain("Hello, "),
            RichText::plain("world").with(Annotation::Italic),
        ];
        assert_eq!(format_spans(&spans, &MARKDOWN_TOKENS), "Hello, _world_");
    }
}
