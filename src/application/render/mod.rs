//! Block tree rendering for every destination.
//!
//! Renderers are pure over an immutable tree: the same tree always yields the
//! same output. Media resolution and uploads go through the per-document
//! [`RenderContext`], which the orchestrator owns.

mod blog;
mod forum;
mod markdown;
mod social;
mod text;
mod thread;
mod tree;
mod types;
mod walk;

pub use blog::{BlogRenderer, CLOSING_MARKER};
pub use forum::ForumRenderer;
pub use markdown::MarkdownRenderer;
pub use social::SocialRenderer;
pub use text::{
    BBCODE_TOKENS, MARKDOWN_TOKENS, SOCIAL_TOKENS, TokenTable, format_span, format_spans,
};
pub use thread::{SEGMENT_LIMIT, ThreadSplitter};
pub use tree::{MAX_TREE_DEPTH, build_tree};
pub use types::{
    Artifact, RenderContext, RenderError, RunMedia, Segment, SegmentMedia, ValidationFailure,
};
pub use walk::{Dialect, closes_list_run, gallery_images, render_blocks};
