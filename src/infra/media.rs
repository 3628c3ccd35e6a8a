//! Mirrors content-source assets into the public object store.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::application::sources::{MediaMirror, ObjectStore, PutOptions, SourceError};

pub struct StoreMirror {
    client: Client,
    store: Arc<dyn ObjectStore>,
    /// Substring identifying URLs hosted by the content source.
    source_host_marker: String,
    directory: String,
}

impl StoreMirror {
    pub fn new(
        client: Client,
        store: Arc<dyn ObjectStore>,
        source_host_marker: impl Into<String>,
        directory: impl Into<String>,
    ) -> Self {
        Self {
            client,
            store,
            source_host_marker: source_host_marker.into(),
            directory: directory.into(),
        }
    }

    fn key_for(&self, digest: &str, extension: Option<&str>) -> String {
        let directory = self.directory.trim_matches('/');
        let name = match extension {
            Some(extension) => format!("{digest}.{extension}"),
            None => digest.to_string(),
        };
        if directory.is_empty() {
            name
        } else {
            format!("{directory}/{name}")
        }
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    mime_guess::get_mime_extensions_str(essence)
        .and_then(|extensions| extensions.first().copied())
}

#[async_trait]
impl MediaMirror for StoreMirror {
    async fn resolve(&self, url: &str) -> Result<String, SourceError> {
        if !url.contains(&self.source_host_marker) {
            return Ok(url.to_string());
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Rejected {
                status: status.as_u16(),
                body: format!("fetching media `{url}`"),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let body = response.bytes().await?;

        let digest = hex::encode(Sha256::digest(&body));
        let key = self.key_for(&digest, extension_for(&content_type));

        if self.store.exists(&key).await? {
            debug!(target = "infra::media", key = %key, "media already mirrored");
            return Ok(self.store.public_url(&key));
        }

        let public = self
            .store
            .put(&key, body, &content_type, PutOptions::default())
            .await?;
        debug!(target = "infra::media", source = url, key = %key, "media mirrored");
        Ok(public)
    }
}
