//! Media storage for uploaded images and swap results.
//!
//! Two distinct namespaces, each backed by `object_store`: uploads keep their
//! original extension under a random name, results are keyed `{task_id}.jpg`
//! so a result location is derivable from the task id alone. Production uses
//! the local filesystem (the results directory doubles as the static-serving
//! root); unit tests use the in-memory backend.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use object_store::{ObjectStore, path::Path as MediaPath};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media not found: {0}")]
    NotFound(String),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MediaError>;

#[derive(Clone)]
pub struct MediaStore {
    uploads: Arc<dyn ObjectStore>,
    results: Arc<dyn ObjectStore>,
    public_url: String,
}

impl MediaStore {
    /// Open filesystem-backed media storage, creating both directories.
    pub fn open(upload_dir: &Path, results_dir: &Path, public_url: String) -> Result<Self> {
        std::fs::create_dir_all(upload_dir)?;
        std::fs::create_dir_all(results_dir)?;

        Ok(Self {
            uploads: Arc::new(object_store::local::LocalFileSystem::new_with_prefix(
                upload_dir,
            )?),
            results: Arc::new(object_store::local::LocalFileSystem::new_with_prefix(
                results_dir,
            )?),
            public_url,
        })
    }

    /// In-memory media storage for tests.
    pub fn in_memory(public_url: &str) -> Self {
        Self {
            uploads: Arc::new(object_store::memory::InMemory::new()),
            results: Arc::new(object_store::memory::InMemory::new()),
            public_url: public_url.to_string(),
        }
    }

    /// Store an uploaded image under a random name, preserving the original
    /// extension. Returns the storage key.
    pub async fn save_upload(&self, original_name: &str, data: Bytes) -> Result<String> {
        let key = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            extension_of(original_name)
        );
        self.uploads.put(&MediaPath::from(key.clone()), data.into()).await?;
        debug!(key, "Upload stored");
        Ok(key)
    }

    /// Read an uploaded image back.
    pub async fn load_upload(&self, key: &str) -> Result<Bytes> {
        match self.uploads.get(&MediaPath::from(key)).await {
            Ok(result) => Ok(result.bytes().await?),
            Err(object_store::Error::NotFound { .. }) => Err(MediaError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Commit a result image for the given task. Returns the result key,
    /// which is always `{task_id}.jpg`.
    pub async fn save_result(&self, task_id: &str, data: Vec<u8>) -> Result<String> {
        let key = format!("{task_id}.jpg");
        self.results.put(&MediaPath::from(key.clone()), data.into()).await?;
        debug!(key, "Result stored");
        Ok(key)
    }

    /// Read a result image back.
    pub async fn load_result(&self, key: &str) -> Result<Bytes> {
        match self.results.get(&MediaPath::from(key)).await {
            Ok(result) => Ok(result.bytes().await?),
            Err(object_store::Error::NotFound { .. }) => Err(MediaError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Public URL for a stored result key.
    pub fn result_url(&self, result_key: &str) -> String {
        format!("{}{}", self.public_url, result_key)
    }
}

/// Extension of an uploaded filename including the dot, or empty when the
/// name has none.
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
