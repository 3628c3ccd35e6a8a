//! Publishable documents tracked by the content source.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::blocks::RichText;

/// Category that suppresses every destination for a document.
pub const FAILED_CATEGORY: &str = "failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Ready,
    Released,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Ready => "ready",
            DocumentStatus::Released => "released",
            DocumentStatus::Failed => "failed",
        }
    }
}

/// A named external file linked from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// Publishable unit with its metadata. The block tree is fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: Vec<RichText>,
    pub subtitle: Vec<RichText>,
    /// Category tags that select destinations.
    pub categories: Vec<String>,
    /// Free-form topic tags carried into rendered front matter.
    pub tags: Vec<String>,
    pub publish_date: Option<Date>,
    pub status: DocumentStatus,
    pub cover: Option<String>,
    pub attachments: Vec<Attachment>,
    /// Unresolved error annotations left by earlier runs.
    pub errors: Vec<String>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Vec::new(),
            subtitle: Vec::new(),
            categories: Vec::new(),
            tags: Vec::new(),
            publish_date: None,
            status: DocumentStatus::Ready,
            cover: None,
            attachments: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|value| value == category)
    }

    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|line| !line.trim().is_empty())
    }

    /// A document is releasable once its publish date lies strictly in the past.
    pub fn can_be_released(&self, now: OffsetDateTime) -> bool {
        self.publish_date
            .map(|date| date.midnight().assume_utc() < now)
            .unwrap_or(false)
    }
}

/// Replace the attachment named `attachment.name`, keeping the others in order.
pub fn replace_attachment(existing: &[Attachment], attachment: Attachment) -> Vec<Attachment> {
    let name = attachment.name.clone();
    existing
        .iter()
        .filter(|entry| entry.name != name)
        .cloned()
        .chain(std::iter::once(attachment))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn release_requires_past_date() {
        let mut document = Document::new("doc");
        let now = datetime!(2024-03-10 12:00 UTC);
        assert!(!document.can_be_released(now));

        document.publish_date = Some(date!(2024 - 03 - 10));
        assert!(document.can_be_released(now));

        document.publish_date = Some(date!(2024 - 03 - 11));
        assert!(!document.can_be_released(now));
    }

    #[test]
    fn replace_attachment_drops_same_name_only() {
        let existing = vec![
            Attachment {
                name: "Markdown file".to_string(),
                url: "https://old".to_string(),
            },
            Attachment {
                name: "Cover".to_string(),
                url: "https://cover".to_string(),
            },
        ];
        let updated = replace_attachment(
            &existing,
            Attachment {
                name: "Markdown file".to_string(),
                url: "https://new".to_string(),
            },
        );

        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].name, "Cover");
        assert_eq!(updated[1].url, "https://new");
    }

    #[test]
    fn blank_error_lines_do_not_count() {
        let mut document = Document::new("doc");
        document.errors = vec!["  ".to_string()];
        assert!(!document.has_errors());
        document.errors.push("social: segment too long".to_string());
        assert!(document.has_errors());
    }
}
