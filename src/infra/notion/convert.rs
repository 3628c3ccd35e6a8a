//! Notion JSON payloads to domain types and back.

use serde_json::{Value, json};
use time::Date;
use time::macros::format_description;

use crate::application::sources::SourceError;
use crate::domain::blocks::{Annotation, Block, BlockKind, ListStyle, MediaRef, RichText};
use crate::domain::documents::{Attachment, Document, DocumentStatus};

/// Property names and select values of the document database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionSchema {
    pub title: String,
    pub subtitle: String,
    pub categories: String,
    pub tags: String,
    pub publish_date: String,
    pub status: String,
    pub files: String,
    pub errors: String,
    pub ready_value: String,
    pub released_value: String,
    pub failed_value: String,
}

impl Default for NotionSchema {
    fn default() -> Self {
        Self {
            title: "Name".to_string(),
            subtitle: "Subtitle".to_string(),
            categories: "Type".to_string(),
            tags: "Tag".to_string(),
            publish_date: "Publish Date".to_string(),
            status: "Status".to_string(),
            files: "Files".to_string(),
            errors: "Errors".to_string(),
            ready_value: "Ready to be released".to_string(),
            released_value: "Released".to_string(),
            failed_value: "Failed".to_string(),
        }
    }
}

impl NotionSchema {
    pub fn status_value(&self, status: DocumentStatus) -> &str {
        match status {
            DocumentStatus::Ready => &self.ready_value,
            DocumentStatus::Released => &self.released_value,
            DocumentStatus::Failed => &self.failed_value,
            DocumentStatus::Draft => "Draft",
        }
    }

    fn status_from(&self, value: Option<&str>) -> DocumentStatus {
        match value {
            Some(value) if value == self.ready_value => DocumentStatus::Ready,
            Some(value) if value == self.released_value => DocumentStatus::Released,
            Some(value) if value == self.failed_value => DocumentStatus::Failed,
            _ => DocumentStatus::Draft,
        }
    }
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

/// Rich-text arrays live under `rich_text` in current API versions and `text` in older ones.
fn spans_of(payload: &Value) -> Vec<RichText> {
    payload
        .get("rich_text")
        .or_else(|| payload.get("text"))
        .map(rich_text)
        .unwrap_or_default()
}

pub fn rich_text(value: &Value) -> Vec<RichText> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| {
            let content = str_at(item, "/text/content")
                .or_else(|| str_at(item, "/plain_text"))
                .unwrap_or_default();
            let link = str_at(item, "/text/link/url")
                .or_else(|| str_at(item, "/href"))
                .map(str::to_string);

            let mut span = RichText::plain(content);
            span.link = link;
            for kind in Annotation::ORDER {
                let flagged = item
                    .pointer(&format!("/annotations/{}", kind.as_str()))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if flagged {
                    span = span.with(kind);
                }
            }
            span
        })
        .collect()
}

fn file_url(value: &Value) -> Option<String> {
    let kind = value.get("type").and_then(Value::as_str)?;
    str_at(value, &format!("/{kind}/url")).map(str::to_string)
}

fn media_of(payload: &Value) -> Option<MediaRef> {
    file_url(payload).map(MediaRef::new)
}

/// Convert one block object. Unknown types become [`BlockKind::Unsupported`].
pub fn block(value: &Value) -> Result<Block, SourceError> {
    let id = str_at(value, "/id")
        .ok_or_else(|| SourceError::invalid_response("block without id"))?;
    let kind_name = str_at(value, "/type")
        .ok_or_else(|| SourceError::invalid_response(format!("block `{id}` without type")))?;
    let payload = value.get(kind_name).cloned().unwrap_or(Value::Null);

    let kind = match kind_name {
        heading if heading.starts_with("heading_") => {
            match heading.trim_start_matches("heading_").parse::<u8>() {
                Ok(level @ 1..=6) => BlockKind::Heading {
                    level,
                    text: spans_of(&payload),
                },
                _ => BlockKind::Unsupported {
                    kind: heading.to_string(),
                },
            }
        }
        "paragraph" => BlockKind::Paragraph {
            text: spans_of(&payload),
        },
        "bulleted_list_item" => BlockKind::ListItem {
            style: ListStyle::Unordered,
            text: spans_of(&payload),
        },
        "numbered_list_item" => BlockKind::ListItem {
            style: ListStyle::Ordered,
            text: spans_of(&payload),
        },
        "image" => match media_of(&payload) {
            Some(media) => BlockKind::Image {
                media,
                caption: payload.get("caption").map(rich_text).unwrap_or_default(),
            },
            None => BlockKind::Unsupported {
                kind: "image".to_string(),
            },
        },
        "audio" => match media_of(&payload) {
            Some(media) => BlockKind::Audio { media },
            None => BlockKind::Unsupported {
                kind: "audio".to_string(),
            },
        },
        "code" => BlockKind::Code {
            language: str_at(&payload, "/language").unwrap_or("plain text").to_string(),
            text: spans_of(&payload),
        },
        "divider" => BlockKind::Divider,
        "callout" => BlockKind::Callout {
            icon: str_at(&payload, "/icon/emoji").map(str::to_string),
            text: spans_of(&payload),
        },
        "column_list" => BlockKind::ColumnGroup,
        "column" => BlockKind::Column,
        other => BlockKind::Unsupported {
            kind: other.to_string(),
        },
    };

    let mut block = Block::new(id, kind);
    block.has_children = value
        .get("has_children")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Ok(block)
}

fn parse_date(value: &str) -> Option<Date> {
    let day = value.get(..10)?;
    Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
}

pub fn format_date(date: Date) -> String {
    date.to_string()
}

fn names(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| str_at(item, "/name").map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn attachments(value: Option<&Value>) -> Vec<Attachment> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(Attachment {
                        name: str_at(item, "/name")?.to_string(),
                        url: file_url(item)?,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Error annotations are stored one per line in a rich-text property.
pub fn error_lines(value: Option<&Value>) -> Vec<String> {
    let text: String = value
        .map(rich_text)
        .unwrap_or_default()
        .into_iter()
        .map(|span| span.content)
        .collect();
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Convert a database page into a document.
pub fn document(page: &Value, schema: &NotionSchema) -> Result<Document, SourceError> {
    let id = str_at(page, "/id").ok_or_else(|| SourceError::invalid_response("page without id"))?;
    let properties = page
        .get("properties")
        .ok_or_else(|| SourceError::invalid_response(format!("page `{id}` without properties")))?;
    let property = |name: &str, field: &str| properties.get(name).and_then(|prop| prop.get(field));

    let mut document = Document::new(id);
    document.title = property(&schema.title, "title").map(rich_text).unwrap_or_default();
    document.subtitle = property(&schema.subtitle, "rich_text")
        .map(rich_text)
        .unwrap_or_default();
    document.categories = names(property(&schema.categories, "multi_select"));
    document.tags = names(property(&schema.tags, "multi_select"));
    document.publish_date = property(&schema.publish_date, "date")
        .and_then(|date| date.get("start"))
        .and_then(Value::as_str)
        .and_then(parse_date);
    document.status = schema.status_from(
        property(&schema.status, "select")
            .and_then(|select| select.get("name"))
            .and_then(Value::as_str),
    );
    document.cover = page.get("cover").and_then(file_url);
    document.attachments = attachments(property(&schema.files, "files"));
    document.errors = error_lines(property(&schema.errors, "rich_text"));
    Ok(document)
}

pub fn attachments_payload(attachments: &[Attachment]) -> Value {
    Value::Array(
        attachments
            .iter()
            .map(|attachment| {
                json!({
                    "name": attachment.name,
                    "type": "external",
                    "external": { "url": attachment.url },
                })
            })
            .collect(),
    )
}

pub fn text_payload(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn converts_annotated_paragraph() {
        let value = json!({
            "id": "b1",
            "type": "paragraph",
            "has_children": false,
            "paragraph": {
                "rich_text": [{
                    "type": "text",
                    "text": { "content": "docs", "link": { "url": "https://example.com" } },
                    "annotations": { "bold": true, "italic": false, "strikethrough": true,
                                     "underline": false, "code": false, "color": "default" },
                    "plain_text": "docs",
                    "href": "https://example.com"
                }]
            }
        });

        let block = block(&value).expect("block");
        let BlockKind::Paragraph { text } = block.kind else {
            panic!("expected paragraph");
        };
        assert_eq!(text[0].content, "docs");
        assert_eq!(text[0].link.as_deref(), Some("https://example.com"));
        assert!(text[0].has(Annotation::Bold));
        assert!(text[0].has(Annotation::Strikethrough));
        assert!(!text[0].has(Annotation::Italic));
    }

    #[test]
    fn legacy_text_key_and_headings() {
        let value = json!({
            "id": "h", "type": "heading_2", "has_children": false,
            "heading_2": { "text": [{ "plain_text": "Intro", "annotations": {} }] }
        });
        assert_eq!(
            block(&value).expect("block").kind,
            BlockKind::Heading {
                level: 2,
                text: vec![RichText::plain("Intro")]
            }
        );
    }

    #[test]
    fn images_and_unknown_types() {
        let image = json!({
            "id": "i", "type": "image", "has_children": false,
            "image": { "type": "file", "file": { "url": "https://s3/secure.notion/a.png" }, "caption": [] }
        });
        assert!(matches!(
            block(&image).expect("image").kind,
            BlockKind::Image { ref media, .. } if media.url == "https://s3/secure.notion/a.png"
        ));

        let embed = json!({ "id": "e", "type": "embed", "has_children": true, "embed": {} });
        let converted = block(&embed).expect("embed");
        assert!(converted.has_children);
        assert_eq!(converted.kind, BlockKind::Unsupported { kind: "embed".to_string() });
    }

    #[test]
    fn converts_page_properties() {
        let page = json!({
            "id": "p1",
            "cover": { "type": "external", "external": { "url": "https://img/cover.jpg" } },
            "properties": {
                "Name": { "title": [{ "plain_text": "Hello", "annotations": {} }] },
                "Subtitle": { "rich_text": [] },
                "Type": { "multi_select": [{ "name": "blog" }, { "name": "tweet" }] },
                "Tag": { "multi_select": [{ "name": "rust" }] },
                "Publish Date": { "date": { "start": "2024-03-10T10:00:00.000+01:00" } },
                "Status": { "select": { "name": "Ready to be released" } },
                "Files": { "files": [{ "name": "Markdown file", "type": "external",
                                        "external": { "url": "https://f/x.md.txt" } }] },
                "Errors": { "rich_text": [{ "plain_text": "social: too long\n", "annotations": {} }] }
            }
        });

        let document = document(&page, &NotionSchema::default()).expect("document");
        assert_eq!(document.categories, ["blog", "tweet"]);
        assert_eq!(document.tags, ["rust"]);
        assert_eq!(document.publish_date, Some(date!(2024 - 03 - 10)));
        assert_eq!(document.status, DocumentStatus::Ready);
        assert_eq!(document.cover.as_deref(), Some("https://img/cover.jpg"));
        assert_eq!(document.attachments[0].name, "Markdown file");
        assert_eq!(document.errors, ["social: too long"]);
    }
}
