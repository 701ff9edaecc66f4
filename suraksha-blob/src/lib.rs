//! # suraksha-blob: media storage for stories
//!
//! Stories reference images and audio by URL. The objects themselves are
//! uploaded by clients directly to S3-compatible storage through presigned
//! URLs; this crate signs those URLs and deletes objects once a story no
//! longer references them.
//!
//! ```text
//! ┌─────────────────┐
//! │  Story service  │  ← business logic only
//! ├─────────────────┤
//! │  MediaAdapter   │  ← key naming, presigning, best-effort cleanup
//! ├─────────────────┤
//! │  MediaStore     │  ← S3 / in-memory primitives
//! └─────────────────┘
//! ```
//!
//! ```rust
//! use suraksha_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> MediaResult<()> {
//! let media = MediaAdapter::new(MemoryMediaStore::new(), MediaConfig::default());
//! let upload = media.presign_upload("image/png").await?;
//! assert!(upload.object_url.ends_with(".png"));
//! # Ok(())
//! # }
//! ```

pub mod adapter;
mod config;
mod error;
mod keys;
mod s3_store;
pub mod store;

pub use adapter::{MediaAdapter, PresignedUpload};
pub use config::MediaConfig;
pub use error::{MediaError, MediaResult, StorageCleanupError};
pub use keys::{FolderKeyStrategy, MediaKeyStrategy, MediaKind};
pub use s3_store::S3MediaStore;
pub use store::{MediaStore, MemoryMediaStore};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        MediaAdapter, MediaConfig, MediaError, MediaResult, MediaStore, MemoryMediaStore,
        PresignedUpload,
    };
}
