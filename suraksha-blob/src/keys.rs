use chrono::Utc;
use uuid::Uuid;

use crate::{MediaConfig, MediaError, MediaResult};

/// Kind of media a story can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    /// Classify a MIME type such as `image/png` or `audio/mpeg`.
    pub fn from_content_type(content_type: &str) -> MediaResult<(Self, String)> {
        let (top, sub) = content_type
            .trim()
            .split_once('/')
            .ok_or_else(|| MediaError::invalid(format!("Invalid file type: {content_type}")))?;

        let sub = sub.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        if sub.is_empty() || !sub.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '+') {
            return Err(MediaError::invalid(format!("Invalid file type: {content_type}")));
        }

        match top.trim().to_ascii_lowercase().as_str() {
            "image" => Ok((MediaKind::Image, sub)),
            "audio" => Ok((MediaKind::Audio, sub)),
            _ => Err(MediaError::invalid(format!(
                "Unsupported file type: {content_type} (expected image/* or audio/*)"
            ))),
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
        }
    }
}

/// Strategy for naming media objects and mapping them to public URLs
pub trait MediaKeyStrategy: Send + Sync {
    /// Generate `(object_key, file_name)` for a new upload
    fn object_key(&self, kind: MediaKind, extension: &str) -> (String, String);

    /// Public URL of an object key
    fn public_url(&self, key: &str) -> String;

    /// Object key behind a public URL, if the URL points into our bucket
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// Folder-per-kind keys: `Uploads/Story-Images/image-<millis>-<rand>.<ext>`
#[derive(Debug, Clone)]
pub struct FolderKeyStrategy {
    base_url: String,
    image_folder: String,
    audio_folder: String,
}

impl FolderKeyStrategy {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            base_url: config.public_base_url(),
            image_folder: config.image_folder.trim_matches('/').to_string(),
            audio_folder: config.audio_folder.trim_matches('/').to_string(),
        }
    }
}

impl MediaKeyStrategy for FolderKeyStrategy {
    fn object_key(&self, kind: MediaKind, extension: &str) -> (String, String) {
        let suffix = Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "{}-{}-{}.{}",
            kind.prefix(),
            Utc::now().timestamp_millis(),
            &suffix[..8],
            extension
        );
        let folder = match kind {
            MediaKind::Image => &self.image_folder,
            MediaKind::Audio => &self.audio_folder,
        };
        (format!("{folder}/{file_name}"), file_name)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        let rest = url.trim().strip_prefix(&self.base_url)?.strip_prefix('/')?;
        let key = rest.split(['?', '#']).next().unwrap_or_default();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> FolderKeyStrategy {
        FolderKeyStrategy::new(&MediaConfig::new().with_bucket("soul").with_region("ap-south-1"))
    }

    #[test]
    fn content_types_are_classified() {
        let (kind, ext) = MediaKind::from_content_type("image/png").unwrap();
        assert_eq!(kind, MediaKind::Image);
        assert_eq!(ext, "png");

        let (kind, ext) = MediaKind::from_content_type("audio/mpeg; codecs=mp3").unwrap();
        assert_eq!(kind, MediaKind::Audio);
        assert_eq!(ext, "mpeg");

        assert!(MediaKind::from_content_type("application/pdf").is_err());
        assert!(MediaKind::from_content_type("png").is_err());
        assert!(MediaKind::from_content_type("image/../x").is_err());
    }

    #[test]
    fn keys_land_in_kind_folders_and_round_trip_through_urls() {
        let keys = strategy();
        let (key, file_name) = keys.object_key(MediaKind::Audio, "ogg");

        assert!(key.starts_with("Uploads/Story-Audio/audio-"));
        assert!(key.ends_with(&file_name));

        let url = keys.public_url(&key);
        assert_eq!(url, format!("https://soul.s3.ap-south-1.amazonaws.com/{key}"));
        assert_eq!(keys.key_for_url(&url), Some(key));
    }

    #[test]
    fn foreign_urls_have_no_key() {
        let keys = strategy();
        assert_eq!(keys.key_for_url("https://cdn.example.com/a.png"), None);
        assert_eq!(keys.key_for_url("https://soul.s3.ap-south-1.amazonaws.com/"), None);
        assert_eq!(
            keys.key_for_url("https://soul.s3.ap-south-1.amazonaws.com/a/b.png?x=1"),
            Some("a/b.png".to_string())
        );
    }
}
