//! Destination adapters, their lifecycle, and the run orchestrator.

mod adapter;
mod attachments;
mod blog;
mod guard;
mod lifecycle;
mod orchestrator;
mod social;

pub use adapter::{Adapter, AdapterError, DocumentRun, Eligibility, PropertyWriter, Stage};
pub use attachments::{
    AttachmentUploader, FORUM_ATTACHMENT, ForumAdapter, MARKDOWN_ATTACHMENT, MarkdownAdapter,
};
pub use blog::BlogAdapter;
pub use guard::{RunGuard, RunPermit};
pub use lifecycle::{AdapterOutcome, PublishMode, dry_run_path, execute};
pub use orchestrator::{Publisher, RunOptions, RunReport, RunStatus, RunSummary};
pub use social::{SocialAdapter, next_publish_date};
