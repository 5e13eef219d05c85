use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::AnnotError;

pub const CACHE_FILE_NAME: &str = "cache.json";
pub const DEFAULT_MAX_ENTRIES: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub url: String,
    pub body: String,
}

/// Persistent URL -> response-text store backing the fetch layer.
///
/// Entries live in insertion order; `save` trims to the newest
/// `max_entries` (FIFO eviction, oldest first) before writing the whole
/// store as one JSON array. The url is the sole lookup key and the first
/// match is authoritative.
#[derive(Debug)]
pub struct ResponseCache {
    path: Utf8PathBuf,
    responses: Vec<CachedResponse>,
    max_entries: usize,
}

impl ResponseCache {
    /// Loads the cache file under `cache_dir`, or starts empty when the
    /// file does not exist yet. A file that exists but does not parse is a
    /// fatal error; there is no partial recovery.
    pub fn load(cache_dir: &Utf8Path, max_entries: usize) -> Result<Self, AnnotError> {
        let path = cache_dir.join(CACHE_FILE_NAME);
        let responses = if path.as_std_path().is_file() {
            let content = fs::read_to_string(path.as_std_path())
                .map_err(|err| AnnotError::Filesystem(err.to_string()))?;
            serde_json::from_str(&content).map_err(|err| AnnotError::CacheCorrupt {
                path: path.clone(),
                message: err.to_string(),
            })?
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            responses,
            max_entries,
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&str> {
        self.responses
            .iter()
            .find(|response| response.url == url)
            .map(|response| response.body.as_str())
    }

    /// Appends a response and persists immediately (write-through).
    pub fn put(&mut self, url: &str, body: &str) -> Result<(), AnnotError> {
        self.responses.push(CachedResponse {
            url: url.to_string(),
            body: body.to_string(),
        });
        self.save()
    }

    /// Trims to the retention cap and writes the store to disk, creating
    /// the cache directory if absent.
    pub fn save(&mut self) -> Result<(), AnnotError> {
        if self.responses.len() > self.max_entries {
            let excess = self.responses.len() - self.max_entries;
            self.responses.drain(..excess);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| AnnotError::Filesystem(err.to_string()))?;
        }
        let content = serde_json::to_vec(&self.responses)
            .map_err(|err| AnnotError::Filesystem(err.to_string()))?;
        write_bytes_atomic(&self.path, &content)
    }
}

fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), AnnotError> {
    let parent = path
        .parent()
        .ok_or_else(|| AnnotError::Filesystem("invalid cache path".to_string()))?;
    let temp = tempfile::Builder::new()
        .prefix("protannot-cache")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| AnnotError::Filesystem(err.to_string()))?;
    fs::write(temp.path(), content).map_err(|err| AnnotError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| AnnotError::Filesystem(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use camino::Utf8PathBuf;

    use super::*;

    fn temp_cache_dir(temp: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().join("urlcache")).unwrap()
    }

    #[test]
    fn round_trip_preserves_mapping() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp_cache_dir(&temp);

        let mut cache = ResponseCache::load(&dir, DEFAULT_MAX_ENTRIES).unwrap();
        cache.put("https://example.org/a", "alpha").unwrap();
        cache.put("https://example.org/b", "beta").unwrap();

        let reloaded = ResponseCache::load(&dir, DEFAULT_MAX_ENTRIES).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("https://example.org/a"), Some("alpha"));
        assert_eq!(reloaded.get("https://example.org/b"), Some("beta"));
        assert_eq!(reloaded.get("https://example.org/c"), None);
    }

    #[test]
    fn save_creates_cache_directory() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp_cache_dir(&temp);
        assert!(!dir.as_std_path().exists());

        let mut cache = ResponseCache::load(&dir, DEFAULT_MAX_ENTRIES).unwrap();
        cache.put("https://example.org/a", "alpha").unwrap();
        assert!(dir.join(CACHE_FILE_NAME).as_std_path().is_file());
    }

    #[test]
    fn retention_cap_evicts_oldest_first() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp_cache_dir(&temp);

        let mut cache = ResponseCache::load(&dir, 3).unwrap();
        for i in 0..5 {
            cache.put(&format!("https://example.org/{i}"), &format!("body{i}")).unwrap();
        }

        let reloaded = ResponseCache::load(&dir, 3).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.get("https://example.org/0"), None);
        assert_eq!(reloaded.get("https://example.org/1"), None);
        // Survivors keep their original order.
        assert_eq!(reloaded.responses[0].url, "https://example.org/2");
        assert_eq!(reloaded.responses[2].url, "https://example.org/4");
    }

    #[test]
    fn malformed_cache_file_is_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp_cache_dir(&temp);
        std::fs::create_dir_all(dir.as_std_path()).unwrap();
        std::fs::write(dir.join(CACHE_FILE_NAME).as_std_path(), "{not json").unwrap();

        let err = ResponseCache::load(&dir, DEFAULT_MAX_ENTRIES).unwrap_err();
        assert_matches!(err, AnnotError::CacheCorrupt { .. });
        assert!(err.is_fatal());
    }

    #[test]
    fn first_match_wins_for_duplicate_urls() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp_cache_dir(&temp);

        let mut cache = ResponseCache::load(&dir, DEFAULT_MAX_ENTRIES).unwrap();
        cache.put("https://example.org/a", "first").unwrap();
        cache.put("https://example.org/a", "second").unwrap();
        assert_eq!(cache.get("https://example.org/a"), Some("first"));
    }
}
