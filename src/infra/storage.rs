//! Filesystem-backed object store served under a public base URL.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;
use url::Url;

use crate::application::sources::{ObjectStore, PutOptions, SourceError};

/// Directory (relative to the root) holding short-lived objects.
pub const TEMPORARY_PREFIX: &str = "tmp";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key `{0}`")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for SourceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(key) => {
                SourceError::invalid_response(format!("invalid object key `{key}`"))
            }
            StorageError::Io(err) => SourceError::unavailable(err),
        }
    }
}

#[derive(Debug)]
pub struct FsObjectStore {
    root: PathBuf,
    public_base: Url,
}

impl FsObjectStore {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf, public_base: Url) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, public_base })
    }

    fn stored_key(key: &str, options: PutOptions) -> String {
        if options.temporary {
            format!("{TEMPORARY_PREFIX}/{key}")
        } else {
            key.to_string()
        }
    }

    /// Resolve the absolute filesystem path for a key, rejecting traversal.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        if key.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(relative))
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let absolute = self.resolve(key)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::File::create(&absolute).await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn exists(&self, key: &str) -> Result<bool, SourceError> {
        let absolute = self.resolve(key)?;
        Ok(fs::try_exists(absolute).await.map_err(StorageError::from)?)
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        options: PutOptions,
    ) -> Result<String, SourceError> {
        let stored = Self::stored_key(key, options);

        if !options.overwrite && self.exists(&stored).await? {
            debug!(target = "infra::storage", key = %stored, "object exists; skipping write");
            return Ok(self.public_url(&stored));
        }

        self.write(&stored, &data).await?;
        debug!(
            target = "infra::storage",
            key = %stored,
            bytes = data.len(),
            content_type,
            "object stored"
        );
        Ok(self.public_url(&stored))
    }

    fn public_url(&self, key: &str) -> String {
        let base = self.public_base.as_str().trim_end_matches('/');
        format!("{base}/{}", key.trim_start_matches('/'))
    }
}
