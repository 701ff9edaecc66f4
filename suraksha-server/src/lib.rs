pub mod config;

use std::sync::Arc;

use anyhow::Result;
use suraksha_axum::{axum, ApiState, AxumApp, JwtActorResolver};
use suraksha_blob::{MediaAdapter, MemoryMediaStore, S3MediaStore};
use suraksha_core::AppConfig;
use suraksha_stories::{MemoryStoryStore, StoryRules, StoryService};
use tracing::{info, warn};

use crate::config::MediaBackend;

/// Wire the story service and its HTTP surface from `config`.
pub async fn build(config: &AppConfig) -> Result<AxumApp> {
    let snapshot = config.snapshot();
    let rules = StoryRules::from_config(&snapshot);

    let media = match config::media_backend(&snapshot) {
        MediaBackend::S3(media_config) => {
            info!(bucket = %media_config.bucket, region = %media_config.region, "using S3 media store");
            let store = S3MediaStore::new(&media_config).await?;
            MediaAdapter::new(store, media_config)
        }
        MediaBackend::Memory(media_config) => {
            warn!("media.region is not set; media objects are kept in memory");
            MediaAdapter::new(MemoryMediaStore::new(), media_config)
        }
    };

    let stories = StoryService::new(Arc::new(MemoryStoryStore::new()), rules).with_media(media);

    let mut state = ApiState::new(stories);
    match snapshot.get_string("auth.jwtSecret") {
        Some(secret) => state = state.with_resolver(JwtActorResolver::new(&secret)),
        None => warn!("auth.jwtSecret is not set; trusting x-actor-id headers"),
    }

    Ok(axum(state))
}
