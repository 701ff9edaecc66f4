use suraksha_blob::MediaConfig;
use suraksha_core::{AppConfig, AppConfigSnapshot};

pub const ENV_PREFIX: &str = "SURAKSHA__";

/// Built-in defaults, before any environment overrides.
pub fn defaults() -> AppConfig {
    let mut config = AppConfig::new();
    config.set_default("http.host", "127.0.0.1");
    config.set_default("http.port", "3036");
    config.set_default("chunks.maxTotal", "1000");
    config.set_default("chunks.maxFragmentChars", "1000");
    config.set_default("chunks.maxContentChars", "100000");
    config.set_default("stories.maxContentChars", "1000");
    config.set_default("stories.pageSizeMax", "10");
    config.set_default("comments.maxChars", "500");
    config.set_default("media.bucket", "soul-suraksha");
    config.set_default("media.presignTtlSecs", "900");
    config
}

/// Defaults overlaid with `SURAKSHA__SECTION__KEY` variables.
pub fn from_env() -> AppConfig {
    let mut config = defaults();
    config.load_env(ENV_PREFIX);
    config
}

/// Where story media lives
#[derive(Debug, Clone)]
pub enum MediaBackend {
    /// In-process store; used when no S3 region is configured
    Memory(MediaConfig),
    S3(MediaConfig),
}

pub fn media_backend(config: &AppConfigSnapshot) -> MediaBackend {
    let mut media = MediaConfig::new();
    if let Some(bucket) = config.get_string("media.bucket") {
        media = media.with_bucket(bucket);
    }
    if let Some(ttl) = config.get_u64("media.presignTtlSecs") {
        media = media.with_presign_ttl(ttl);
    }
    if let Some(endpoint) = config.get_string("media.endpoint") {
        media = media.with_endpoint(endpoint);
    }
    match config.get_string("media.region") {
        Some(region) => MediaBackend::S3(media.with_region(region)),
        None => MediaBackend::Memory(media),
    }
}
