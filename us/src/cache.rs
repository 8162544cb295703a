//! Time-bounded memoization of analysis results
//!
//! Entries expire after `max-age` and the cache never holds more than
//! `max-size` entries. When full, the entry inserted first is evicted (FIFO);
//! reads do not refresh an entry's position.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::{AnalysisResult, ImagePayload};

/// Characters of text that make up a fingerprint key
const FINGERPRINT_TEXT_CHARS: usize = 100;

/// Characters of each image's base64 data that make up a fingerprint key
const FINGERPRINT_IMAGE_CHARS: usize = 20;

/// How cache keys are derived from a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// Text prefix plus image-data prefixes. Cheap, but inputs sharing a
    /// prefix collide.
    #[default]
    Fingerprint,

    /// SHA-256 over the full text and every image
    Digest,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in milliseconds
    #[serde(rename = "max-age-ms")]
    pub max_age_ms: u64,

    /// Maximum number of entries
    #[serde(rename = "max-size")]
    pub max_size: usize,

    #[serde(rename = "key-strategy")]
    pub key_strategy: KeyStrategy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_ms: 5 * 60 * 1000,
            max_size: 50,
            key_strategy: KeyStrategy::Fingerprint,
        }
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }
}

/// Cache occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
}

struct CacheEntry {
    result: Arc<AnalysisResult>,
    stored_at: Instant,
}

/// Bounded, expiring result cache
pub struct ResultCache {
    config: CacheConfig,

    /// Entries in insertion order, oldest first
    entries: Mutex<IndexMap<String, CacheEntry>>,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        debug!(?config, "ResultCache::new: called");
        Self {
            config,
            entries: Mutex::new(IndexMap::new()),
        }
    }

    /// Derive the lookup key for a request
    pub fn compute_key(&self, text: &str, images: &[ImagePayload]) -> String {
        match self.config.key_strategy {
            KeyStrategy::Fingerprint => fingerprint(text, images),
            KeyStrategy::Digest => digest(text, images),
        }
    }

    /// Fresh result for this request, if any
    ///
    /// An expired entry is evicted and reported as a miss.
    pub async fn get(&self, text: &str, images: &[ImagePayload]) -> Option<Arc<AnalysisResult>> {
        let key = self.compute_key(text, images);
        let mut entries = self.entries.lock().await;

        let entry = entries.get(&key)?;
        if Instant::now().duration_since(entry.stored_at) > self.config.max_age() {
            debug!(%key, "ResultCache::get: entry expired, evicting");
            entries.shift_remove(&key);
            return None;
        }

        debug!(%key, "ResultCache::get: hit");
        Some(Arc::clone(&entry.result))
    }

    /// Store a result, evicting the oldest insertion when full
    ///
    /// Storing under an existing key replaces that entry and keeps its place
    /// in the eviction order.
    pub async fn set(&self, text: &str, images: &[ImagePayload], result: Arc<AnalysisResult>) {
        if self.config.max_size == 0 {
            return;
        }

        let key = self.compute_key(text, images);
        let mut entries = self.entries.lock().await;
        let entry = CacheEntry {
            result,
            stored_at: Instant::now(),
        };

        if let Some(existing) = entries.get_mut(&key) {
            debug!(%key, "ResultCache::set: replacing existing entry");
            *existing = entry;
            return;
        }

        if entries.len() >= self.config.max_size {
            if let Some((oldest, _)) = entries.shift_remove_index(0) {
                debug!(key = %oldest, "ResultCache::set: full, evicting oldest");
            }
        }

        debug!(%key, "ResultCache::set: storing");
        entries.insert(key, entry);
    }

    pub async fn clear(&self) {
        debug!("ResultCache::clear: called");
        self.entries.lock().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.lock().await.len(),
            max_size: self.config.max_size,
        }
    }
}

fn fingerprint(text: &str, images: &[ImagePayload]) -> String {
    let text_key: String = text.chars().take(FINGERPRINT_TEXT_CHARS).collect();
    let image_key = images
        .iter()
        .map(|img| img.data.chars().take(FINGERPRINT_IMAGE_CHARS).collect::<String>())
        .collect::<Vec<_>>()
        .join("_");
    format!("{}_{}", text_key, image_key)
}

fn digest(text: &str, images: &[ImagePayload]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    for image in images {
        hasher.update([0u8]);
        hasher.update(image.mime_type.as_bytes());
        hasher.update([0u8]);
        hasher.update(image.data.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
