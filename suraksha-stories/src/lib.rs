//! # suraksha-stories
//!
//! Stories arrive either whole (single-shot) or as an ordered sequence of
//! text fragments (chunked). Chunked submissions survive flaky networks:
//! retransmitted fragments are no-ops, gaps are refused with the index the
//! server expects, and the story only becomes complete once, when its last
//! fragment lands.
//!
//! ```rust
//! use std::sync::Arc;
//! use suraksha_core::ActorId;
//! use suraksha_stories::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> StoryResult<()> {
//! let service = StoryService::new(Arc::new(MemoryStoryStore::new()), StoryRules::default());
//! let actor = ActorId::new("student-1");
//!
//! let first = service
//!     .submit(&actor, Route::Create, serde_json::from_value(serde_json::json!({
//!         "isChunk": true, "chunkIndex": 0, "totalChunks": 2, "content": "Once upon ",
//!     })).unwrap())
//!     .await?;
//! assert!(!first.is_complete);
//!
//! let last = service
//!     .submit(&actor, Route::Create, serde_json::from_value(serde_json::json!({
//!         "isChunk": true, "chunkIndex": 1, "totalChunks": 2,
//!         "storyId": first.story_id, "content": "a time", "title": "Courage",
//!     })).unwrap())
//!     .await?;
//! assert!(last.is_complete);
//! assert_eq!(last.data.unwrap().content, "Once upon a time");
//! # Ok(())
//! # }
//! ```

mod comment;
mod config;
mod error;
mod memory_store;
pub mod mode;
mod patch;
pub mod reassembly;
mod service;
pub mod session;
mod store;
mod story;
pub mod view;

pub use comment::{Comment, CommentRequest, LikeState};
pub use config::StoryRules;
pub use error::{FieldErrors, StoryError, StoryResult};
pub use memory_store::MemoryStoryStore;
pub use mode::{Fragment, Route, SingleShot, SubmissionRequest, UploadMode, UploadModeSelector};
pub use patch::Patch;
pub use reassembly::{ChunkProgress, FragmentOutcome, FragmentReceipt, ReassemblyController};
pub use service::{Pagination, StoryListing, StoryService, SubmissionReply};
pub use session::{ChunkSession, ChunkState};
pub use store::{StoryPage, StoryQuery, StoryStore, StoryTx};
pub use story::{Story, StoryId, StoryMetadata};
pub use view::{CommentView, StoryView};

pub mod prelude {
    pub use crate::{
        ChunkProgress, CommentRequest, MemoryStoryStore, Patch, Route, Story, StoryError,
        StoryId, StoryResult, StoryRules, StoryService, StoryView, SubmissionReply,
        SubmissionRequest,
    };
}
