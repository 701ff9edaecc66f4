use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    FolderKeyStrategy, MediaConfig, MediaError, MediaKeyStrategy, MediaKind, MediaResult,
    MediaStore, StorageCleanupError,
};

/// A signed upload slot handed to the client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub presigned_url: String,
    pub object_url: String,
    pub file_name: String,
    pub key: String,
    pub expires_at: i64,
}

/// Media coordination embedded by services that reference media.
///
/// Owns no global clients: the store is injected at construction.
#[derive(Clone)]
pub struct MediaAdapter {
    store: Arc<dyn MediaStore>,
    keys: Arc<dyn MediaKeyStrategy>,
    config: MediaConfig,
}

impl MediaAdapter {
    pub fn new<S: MediaStore + 'static>(store: S, config: MediaConfig) -> Self {
        Self::from_store(Arc::new(store), config)
    }

    pub fn from_store(store: Arc<dyn MediaStore>, config: MediaConfig) -> Self {
        Self {
            store,
            keys: Arc::new(FolderKeyStrategy::new(&config)),
            config,
        }
    }

    pub fn with_key_strategy<K: MediaKeyStrategy + 'static>(mut self, keys: K) -> Self {
        self.keys = Arc::new(keys);
        self
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// Reserve an object key for `content_type` and sign an upload URL for it.
    pub async fn presign_upload(&self, content_type: &str) -> MediaResult<PresignedUpload> {
        let (kind, extension) = MediaKind::from_content_type(content_type)?;
        let (key, file_name) = self.keys.object_key(kind, &extension);

        let ttl = self.config.presign_ttl_secs;
        if ttl == 0 {
            return Err(MediaError::invalid("Presigned URL lifetime must be positive"));
        }

        let presigned_url = self.store.sign_put(&key, content_type.trim(), ttl).await?;
        let object_url = self.keys.public_url(&key);

        debug!(key = %key, "signed media upload");

        Ok(PresignedUpload {
            presigned_url,
            object_url,
            file_name,
            key,
            expires_at: Utc::now().timestamp() + ttl as i64,
        })
    }

    /// Delete superseded media objects, one by one.
    ///
    /// URLs outside our bucket are skipped. Failures are logged and
    /// returned; they never abort the remaining deletions.
    pub async fn cleanup(&self, urls: &[String]) -> Vec<StorageCleanupError> {
        let mut failures = Vec::new();

        for url in urls {
            let Some(key) = self.keys.key_for_url(url) else {
                debug!(url = %url, "skipping media url outside the bucket");
                continue;
            };

            match self.store.delete(&key).await {
                Ok(()) => info!(key = %key, "removed superseded media"),
                Err(error) => {
                    let failure = StorageCleanupError {
                        url: url.clone(),
                        error,
                    };
                    warn!(error = %failure, "media cleanup failed");
                    failures.push(failure);
                }
            }
        }

        failures
    }

    /// Run [`MediaAdapter::cleanup`] in the background.
    ///
    /// Returns `None` when there is nothing to clean up.
    pub fn retire(&self, urls: Vec<String>) -> Option<JoinHandle<Vec<StorageCleanupError>>> {
        if urls.is_empty() {
            return None;
        }
        let adapter = self.clone();
        Some(tokio::spawn(async move { adapter.cleanup(&urls).await }))
    }
}
