use std::sync::Arc;

use suraksha_stories::StoryService;

use crate::auth::{ActorResolver, HeaderActorResolver};

/// Shared by every handler
#[derive(Clone)]
pub struct ApiState {
    pub stories: StoryService,
    pub resolver: Arc<dyn ActorResolver>,
}

impl ApiState {
    /// Identity comes from gateway headers until a resolver is set.
    pub fn new(stories: StoryService) -> Self {
        Self {
            stories,
            resolver: Arc::new(HeaderActorResolver),
        }
    }

    pub fn with_resolver<R: ActorResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }
}
