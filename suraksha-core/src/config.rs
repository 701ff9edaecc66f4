//! # Configuration
//!
//! A flat string key/value store with dotted keys (`http.port`,
//! `chunks.maxTotal`). Values are layered by the application: defaults
//! first, then environment overrides via [`AppConfig::load_env`].
//!
//! ```rust
//! use suraksha_core::AppConfig;
//!
//! let mut config = AppConfig::new();
//! config.set("chunks.maxTotal", "500");
//!
//! let snapshot = config.snapshot();
//! assert_eq!(snapshot.get_u32("chunks.maxTotal"), Some(500));
//! ```
//!
//! Environment variables map onto keys by stripping the prefix and
//! turning `__` into `.`:
//!
//! ```bash
//! export SURAKSHA__HTTP__PORT=8080          # http.port
//! export SURAKSHA__CHUNKS__MAXTOTAL=200     # chunks.maxtotal
//! ```
//!
//! Lookups are case-insensitive so `chunks.maxtotal` and `chunks.maxTotal`
//! name the same entry.

use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

fn normalize_key(key: &str) -> String {
    key.to_ascii_lowercase()
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        self.values.insert(normalize_key(key.as_ref()), value.into());
    }

    /// Set a key only when nothing has been set for it yet.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        self.values
            .entry(normalize_key(key.as_ref()))
            .or_insert_with(|| value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(&normalize_key(key))
    }

    /// Overlay variables named `{prefix}SECTION__KEY` as `section.key`.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_vars(prefix, std::env::vars());
    }

    /// Same as [`AppConfig::load_env`] over an explicit iterator.
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.replace("__", ".");
                if normalized.is_empty() {
                    continue;
                }
                self.set(normalized, value);
            }
        }
    }

    pub fn snapshot(&self) -> AppConfigSnapshot {
        AppConfigSnapshot {
            map: self.values.clone(),
        }
    }
}

/// Read-only view handed to services at construction time.
#[derive(Debug, Clone, Default)]
pub struct AppConfigSnapshot {
    map: HashMap<String, String>,
}

impl AppConfigSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(&normalize_key(key)).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.trim().parse::<u32>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_map_double_underscore_to_dots() {
        let mut config = AppConfig::new();
        config.set("http.port", "3036");
        config.load_vars(
            "SURAKSHA__",
            vec![
                ("SURAKSHA__HTTP__PORT".to_string(), "8080".to_string()),
                ("SURAKSHA__CHUNKS__MAXTOTAL".to_string(), "12".to_string()),
                ("OTHER__HTTP__PORT".to_string(), "1".to_string()),
            ],
        );

        let snapshot = config.snapshot();
        assert_eq!(snapshot.get("http.port"), Some("8080"));
        assert_eq!(snapshot.get_u32("chunks.maxTotal"), Some(12));
    }

    #[test]
    fn set_default_does_not_clobber() {
        let mut config = AppConfig::new();
        config.set("media.bucket", "custom");
        config.set_default("media.bucket", "soul-suraksha");
        config.set_default("media.presignTtlSecs", "900");

        assert_eq!(config.get("media.bucket"), Some("custom"));
        assert_eq!(config.snapshot().get_u64("media.presignttlsecs"), Some(900));
    }

    #[test]
    fn typed_getters_reject_garbage() {
        let mut config = AppConfig::new();
        config.set("stories.pageSizeMax", "ten");
        config.set("auth.enabled", "true");

        let snapshot = config.snapshot();
        assert_eq!(snapshot.get_usize("stories.pageSizeMax"), None);
        assert_eq!(snapshot.get_bool("auth.enabled"), Some(true));
        assert!(!config.has("missing.key"));
    }
}
