use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{MediaError, MediaResult};

/// Storage primitives the media layer needs.
///
/// Uploads go straight from the client to the store through presigned
/// URLs, so the server only signs and deletes.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> MediaResult<()>;

    /// Sign a URL the client can `PUT` the object to
    async fn sign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in_secs: u64,
    ) -> MediaResult<String>;
}

/// In-memory store for tests and local runs.
///
/// Remembers what was signed and deleted; can be told to fail deletes.
#[derive(Clone, Default)]
pub struct MemoryMediaStore {
    objects: Arc<RwLock<BTreeMap<String, String>>>,
    deleted: Arc<RwLock<Vec<String>>>,
    fail_deletes: Arc<AtomicBool>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend an object was uploaded under `key`.
    pub fn insert(&self, key: &str, content_type: &str) {
        self.objects.write().insert(key.to_string(), content_type.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    /// Keys deleted so far, in order
    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.read().clone()
    }

    /// Make every subsequent delete fail with a backend error
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn delete(&self, key: &str) -> MediaResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(MediaError::backend(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("delete of {key} refused"),
            )));
        }
        self.objects.write().remove(key);
        self.deleted.write().push(key.to_string());
        Ok(())
    }

    async fn sign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in_secs: u64,
    ) -> MediaResult<String> {
        if expires_in_secs == 0 {
            return Err(MediaError::invalid("Presigned URL lifetime must be positive"));
        }
        self.insert(key, content_type);
        Ok(format!(
            "memory://{key}?content-type={content_type}&expires-in={expires_in_secs}"
        ))
    }
}
