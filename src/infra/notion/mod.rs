//! Content source backed by a Notion database.

mod convert;

pub use convert::NotionSchema;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;
use url::Url;

use crate::application::sources::{ContentSource, PropertyUpdate, SourceError};
use crate::domain::blocks::Block;
use crate::domain::documents::{Attachment, Document, DocumentStatus};

const PAGE_SIZE: &str = "100";

#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub api_base: Url,
    pub token: String,
    pub version: String,
    pub database_id: String,
    pub schema: NotionSchema,
}

pub struct NotionSource {
    client: Client,
    config: NotionConfig,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

impl NotionSource {
    pub fn new(client: Client, config: NotionConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, path: &str) -> Result<Url, SourceError> {
        self.config
            .api_base
            .join(path)
            .map_err(|err| SourceError::invalid_response(format!("invalid API path `{path}`: {err}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.config.token)
            .header("Notion-Version", &self.config.version)
    }

    async fn send<T>(&self, builder: RequestBuilder) -> Result<T, SourceError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = builder.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn page(&self, document_id: &str) -> Result<Value, SourceError> {
        let url = self.url(&format!("pages/{document_id}"))?;
        self.send(self.request(Method::GET, url)).await
    }

    async fn patch_properties(&self, document_id: &str, properties: Value) -> Result<(), SourceError> {
        let url = self.url(&format!("pages/{document_id}"))?;
        let _: Value = self
            .send(
                self.request(Method::PATCH, url)
                    .json(&json!({ "properties": properties })),
            )
            .await?;
        Ok(())
    }

    fn single_property(name: &str, value: Value) -> Value {
        let mut properties = Map::new();
        properties.insert(name.to_string(), value);
        Value::Object(properties)
    }
}

#[async_trait]
impl ContentSource for NotionSource {
    async fn query_ready(&self) -> Result<Vec<Document>, SourceError> {
        let schema = &self.config.schema;
        let url = self.url(&format!("databases/{}/query", self.config.database_id))?;
        let mut documents = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({
                "filter": {
                    "property": schema.status,
                    "select": { "equals": schema.ready_value },
                },
                "page_size": 100,
            });
            if let Some(cursor) = &cursor {
                body["start_cursor"] = json!(cursor);
            }

            let page: ListResponse = self
                .send(self.request(Method::POST, url.clone()).json(&body))
                .await?;
            for result in &page.results {
                documents.push(convert::document(result, schema)?);
            }

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        debug!(target = "infra::notion", count = documents.len(), "queried ready documents");
        Ok(documents)
    }

    async fn fetch_children(&self, block_id: &str) -> Result<Vec<Block>, SourceError> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut url = self.url(&format!("blocks/{block_id}/children"))?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("page_size", PAGE_SIZE);
                if let Some(cursor) = &cursor {
                    query.append_pair("start_cursor", cursor);
                }
            }

            let page: ListResponse = self.send(self.request(Method::GET, url)).await?;
            for result in &page.results {
                blocks.push(convert::block(result)?);
            }

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(blocks)
    }

    async fn update_status(&self, document_id: &str, status: DocumentStatus) -> Result<(), SourceError> {
        let schema = &self.config.schema;
        let value = json!({ "select": { "name": schema.status_value(status) } });
        self.patch_properties(document_id, Self::single_property(&schema.status, value))
            .await
    }

    async fn update_property(&self, document_id: &str, update: PropertyUpdate) -> Result<(), SourceError> {
        let schema = &self.config.schema;
        let properties = match update {
            PropertyUpdate::PublishDate(date) => Self::single_property(
                &schema.publish_date,
                json!({ "date": { "start": convert::format_date(date) } }),
            ),
            PropertyUpdate::Attachments(attachments) => Self::single_property(
                &schema.files,
                json!({ "files": convert::attachments_payload(&attachments) }),
            ),
        };
        self.patch_properties(document_id, properties).await
    }

    async fn fetch_attachments(&self, document_id: &str) -> Result<Vec<Attachment>, SourceError> {
        let page = self.page(document_id).await?;
        let files = page
            .pointer(&format!("/properties/{}/files", self.config.schema.files))
            .cloned();
        Ok(convert::attachments(files.as_ref()))
    }

    async fn append_error_annotation(&self, document_id: &str, message: &str) -> Result<(), SourceError> {
        let schema = &self.config.schema;
        let page = self.page(document_id).await?;
        let existing = page
            .get("properties")
            .and_then(|properties| properties.get(&schema.errors))
            .and_then(|property| property.get("rich_text"));

        let mut lines = convert::error_lines(existing);
        lines.push(message.to_string());
        let value = json!({ "rich_text": convert::text_payload(&lines.join("\n")) });

        self.patch_properties(document_id, Self::single_property(&schema.errors, value))
            .await
    }
}
