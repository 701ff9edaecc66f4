use suraksha_core::AppConfigSnapshot;

/// Limits applied to submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRules {
    /// Largest `totalChunks` a client may declare
    pub max_total_chunks: u32,
    /// Per fragment, in characters
    pub max_fragment_chars: usize,
    /// Assembled chunked content, in characters
    pub max_content_chars: usize,
    /// Single-shot content, in characters
    pub max_single_shot_chars: usize,
    pub page_size_max: usize,
    /// Per comment, in characters
    pub max_comment_chars: usize,
}

impl Default for StoryRules {
    fn default() -> Self {
        Self {
            max_total_chunks: 1000,
            max_fragment_chars: 1000,
            max_content_chars: 100_000,
            max_single_shot_chars: 1000,
            page_size_max: 10,
            max_comment_chars: 500,
        }
    }
}

impl StoryRules {
    /// Read `chunks.*`, `stories.*` and `comments.*` keys, keeping defaults for missing ones.
    pub fn from_config(config: &AppConfigSnapshot) -> Self {
        let defaults = Self::default();
        Self {
            max_total_chunks: config
                .get_u32("chunks.maxTotal")
                .unwrap_or(defaults.max_total_chunks),
            max_fragment_chars: config
                .get_usize("chunks.maxFragmentChars")
                .unwrap_or(defaults.max_fragment_chars),
            max_content_chars: config
                .get_usize("chunks.maxContentChars")
                .unwrap_or(defaults.max_content_chars),
            max_single_shot_chars: config
                .get_usize("stories.maxContentChars")
                .unwrap_or(defaults.max_single_shot_chars),
            page_size_max: config
                .get_usize("stories.pageSizeMax")
                .unwrap_or(defaults.page_size_max)
                .max(1),
            max_comment_chars: config
                .get_usize("comments.maxChars")
                .unwrap_or(defaults.max_comment_chars),
        }
    }
}
