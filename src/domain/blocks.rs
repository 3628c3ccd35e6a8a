//! Content tree model: ordered blocks carrying rich-text spans.

use serde::{Deserialize, Serialize};

/// Inline annotation kinds a span may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    Bold,
    Italic,
    Code,
    Strikethrough,
    Underline,
}

impl Annotation {
    /// Application order used by every formatter. Earlier kinds wrap first and
    /// therefore end up innermost.
    pub const ORDER: [Annotation; 5] = [
        Annotation::Bold,
        Annotation::Italic,
        Annotation::Code,
        Annotation::Strikethrough,
        Annotation::Underline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Annotation::Bold => "bold",
            Annotation::Italic => "italic",
            Annotation::Code => "code",
            Annotation::Strikethrough => "strikethrough",
            Annotation::Underline => "underline",
        }
    }
}

/// One run of text with an optional link and a set of annotations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RichText {
    pub content: String,
    pub link: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl RichText {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with(mut self, annotation: Annotation) -> Self {
        if !self.annotations.contains(&annotation) {
            self.annotations.push(annotation);
        }
        self
    }

    pub fn has(&self, annotation: Annotation) -> bool {
        self.annotations.contains(&annotation)
    }
}

/// Concatenate the raw text of a span list, ignoring links and annotations.
pub fn plain_text(spans: &[RichText]) -> String {
    spans.iter().map(|span| span.content.as_str()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStyle {
    Ordered,
    Unordered,
}

/// Reference to a binary asset hosted by the content source or an external host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
}

impl MediaRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Variant payloads of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Heading {
        level: u8,
        text: Vec<RichText>,
    },
    Paragraph {
        text: Vec<RichText>,
    },
    ListItem {
        style: ListStyle,
        text: Vec<RichText>,
    },
    Image {
        media: MediaRef,
        caption: Vec<RichText>,
    },
    Audio {
        media: MediaRef,
    },
    Code {
        language: String,
        text: Vec<RichText>,
    },
    Divider,
    Callout {
        icon: Option<String>,
        text: Vec<RichText>,
    },
    ColumnGroup,
    Column,
    Unsupported {
        kind: String,
    },
}

/// Fieldless discriminant of [`BlockKind`], used for sibling comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockVariant {
    Heading(u8),
    Paragraph,
    ListItem(ListStyle),
    Image,
    Audio,
    Code,
    Divider,
    Callout,
    ColumnGroup,
    Column,
    Unsupported,
}

impl BlockKind {
    pub fn variant(&self) -> BlockVariant {
        match self {
            BlockKind::Heading { level, .. } => BlockVariant::Heading(*level),
            BlockKind::Paragraph { .. } => BlockVariant::Paragraph,
            BlockKind::ListItem { style, .. } => BlockVariant::ListItem(*style),
            BlockKind::Image { .. } => BlockVariant::Image,
            BlockKind::Audio { .. } => BlockVariant::Audio,
            BlockKind::Code { .. } => BlockVariant::Code,
            BlockKind::Divider => BlockVariant::Divider,
            BlockKind::Callout { .. } => BlockVariant::Callout,
            BlockKind::ColumnGroup => BlockVariant::ColumnGroup,
            BlockKind::Column => BlockVariant::Column,
            BlockKind::Unsupported { .. } => BlockVariant::Unsupported,
        }
    }

    /// Source-side type name, used in log output.
    pub fn name(&self) -> &str {
        match self {
            BlockKind::Heading { .. } => "heading",
            BlockKind::Paragraph { .. } => "paragraph",
            BlockKind::ListItem {
                style: ListStyle::Ordered,
                ..
            } => "numbered_list_item",
            BlockKind::ListItem {
                style: ListStyle::Unordered,
                ..
            } => "bulleted_list_item",
            BlockKind::Image { .. } => "image",
            BlockKind::Audio { .. } => "audio",
            BlockKind::Code { .. } => "code",
            BlockKind::Divider => "divider",
            BlockKind::Callout { .. } => "callout",
            BlockKind::ColumnGroup => "column_list",
            BlockKind::Column => "column",
            BlockKind::Unsupported { kind } => kind.as_str(),
        }
    }
}

/// One node of a document's content tree.
///
/// `children` is populated by the tree builder only for blocks the source
/// reports as having children; it preserves document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub has_children: bool,
    pub kind: BlockKind,
    #[serde(default)]
    pub children: Vec<Block>,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            has_children: false,
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.has_children = !children.is_empty();
        self.children = children;
        self
    }

    pub fn variant(&self) -> BlockVariant {
        self.kind.variant()
    }
}
