// A1 - autonomous single-transaction EVM exploit agent
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Content-addressed cache with TTL, shared by every I/O-bound collaborator.
//!
//! Keys are the SHA-256 digest of a canonical `(args, kwargs)` encoding (see
//! [`Cache::make_key`]); values are persisted to `<cache_dir>/<key>.json` and mirrored in an
//! in-memory [`DashMap`] index so concurrent readers never contend on the filesystem for a hit.

use std::{fs, path::PathBuf, time::Duration};

use dashmap::DashMap;
use eyre::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{trace, warn};

/// Default TTL applied to cache entries when the caller does not specify one.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Returns the path to a1's cache dir: `~/.a1/cache` by default.
pub trait CachePath {
    /// Root of the cache tree, if the cache is enabled.
    fn cache_dir(&self) -> Option<PathBuf>;

    /// Whether a filesystem-backed cache is configured.
    fn is_valid(&self) -> bool {
        self.cache_dir().is_some()
    }
}

/// Default cache path rooted at `~/.a1/cache`, following the dotfile-directory convention.
#[derive(Debug, Clone)]
pub struct A1CachePath {
    root: Option<PathBuf>,
}

impl Default for A1CachePath {
    fn default() -> Self {
        Self { root: dirs_next::home_dir().map(|p| p.join(".a1").join("cache")) }
    }
}

impl A1CachePath {
    /// New cache path rooted at `root`, or the default `~/.a1/cache` if `root` is `None`.
    pub fn new(root: Option<impl Into<PathBuf>>) -> Self {
        Self {
            root: root
                .map(Into::into)
                .or_else(|| dirs_next::home_dir().map(|p| p.join(".a1").join("cache"))),
        }
    }

    /// A cache path with no backing directory; every entry lives only in memory.
    pub fn empty() -> Self {
        Self { root: None }
    }
}

impl CachePath for A1CachePath {
    fn cache_dir(&self) -> Option<PathBuf> {
        self.root.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    data: Value,
    created_at: u64,
    /// `None` means the entry never expires.
    ttl_secs: Option<u64>,
}

impl CacheEntry {
    fn new(data: Value, ttl: Option<Duration>) -> Self {
        Self { data, created_at: now_secs(), ttl_secs: ttl.map(|d| d.as_secs()) }
    }

    fn is_expired(&self) -> bool {
        match self.ttl_secs {
            Some(ttl) => now_secs() > self.created_at.saturating_add(ttl),
            None => false,
        }
    }
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// A content-addressed, TTL'd cache safe for concurrent use.
///
/// Keys are hash-addressed rather than per-label files, and a [`DashMap`] fronts the on-disk store
/// so concurrent callers never block each other on a cache hit.
#[derive(Debug)]
pub struct Cache {
    dir: Option<PathBuf>,
    default_ttl: Option<Duration>,
    index: DashMap<String, CacheEntry>,
}

impl Cache {
    /// New cache backed by `dir` (created if missing), or purely in-memory if `dir` is `None`.
    pub fn new(dir: Option<impl Into<PathBuf>>, default_ttl: Option<Duration>) -> Result<Self> {
        let dir = dir.map(Into::into);
        if let Some(dir) = &dir {
            fs::create_dir_all(dir)?;
        }
        Ok(Self { dir, default_ttl, index: DashMap::new() })
    }

    /// Cache rooted at the given [`CachePath`], with the given default TTL.
    pub fn from_path(path: &impl CachePath, default_ttl: Option<Duration>) -> Result<Self> {
        Self::new(path.cache_dir(), default_ttl)
    }

    /// Computes the content-addressed key for an `(args, kwargs)` pair.
    ///
    /// `kwargs` is serialized through [`serde_json::Map`], which this workspace builds without
    /// the `preserve_order` feature and therefore orders keys lexicographically, giving a
    /// deterministic encoding independent of call-site insertion order.
    pub fn make_key<A: Serialize, K: Serialize>(args: &A, kwargs: &K) -> String {
        let envelope = serde_json::json!({ "args": args, "kwargs": kwargs });
        let bytes = serde_json::to_vec(&envelope).unwrap_or_default();
        let digest = Sha256::digest(&bytes);
        hex::encode(digest)
    }

    /// Convenience wrapper for the common case of keying on a flat list of `Display` parts
    /// (e.g. `Cache::make_key_parts(&["source", &chain_id.to_string(), &address.to_string()])`).
    pub fn make_key_parts(parts: &[&str]) -> String {
        Self::make_key(&parts, &serde_json::Value::Null)
    }

    fn file_for(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{key}.json")))
    }

    /// Returns the cached value for `key`, or `None` on miss or expiry. An expired entry is
    /// deleted as a side effect of this call.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(entry) = self.index.get(key).map(|e| e.clone()) {
            if entry.is_expired() {
                trace!(%key, "cache entry expired (memory)");
                self.delete(key).ok();
                return None;
            }
            return serde_json::from_value(entry.data).ok();
        }

        let file = self.file_for(key)?;
        if !file.exists() {
            return None;
        }
        let content = fs::read_to_string(&file).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(e) => e,
            Err(_) => {
                warn!(?file, "cache file corrupted, removing");
                let _ = fs::remove_file(&file);
                return None;
            }
        };

        if entry.is_expired() {
            trace!(?file, "cache file expired, removing");
            let _ = fs::remove_file(&file);
            return None;
        }

        let value = serde_json::from_value(entry.data.clone()).ok();
        self.index.insert(key.to_string(), entry);
        value
    }

    /// Stores `value` under `key` with `ttl` (or the cache's default TTL if `None`).
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
        let data = serde_json::to_value(value)?;
        let entry = CacheEntry::new(data, ttl.or(self.default_ttl));

        if let Some(file) = self.file_for(key) {
            fs::write(&file, serde_json::to_string(&entry)?)?;
        }
        self.index.insert(key.to_string(), entry);
        Ok(())
    }

    /// Removes `key` from both the in-memory index and the backing file, if any.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.index.remove(key);
        if let Some(file) = self.file_for(key) {
            if file.exists() {
                fs::remove_file(file)?;
            }
        }
        Ok(())
    }

    /// Clears every entry, in memory and on disk.
    pub fn clear(&self) -> Result<()> {
        self.index.clear();
        if let Some(dir) = &self.dir {
            if dir.exists() {
                for entry in fs::read_dir(dir)?.flatten() {
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == "json") {
                        fs::remove_file(path)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Deletes every expired entry (memory and disk) and returns how many were removed.
    pub fn cleanup_expired(&self) -> Result<usize> {
        let mut removed = 0usize;

        let expired_keys: Vec<String> = self
            .index
            .iter()
            .filter(|e| e.value().is_expired())
            .map(|e| e.key().clone())
            .collect();
        for key in expired_keys {
            self.delete(&key)?;
            removed += 1;
        }

        if let Some(dir) = &self.dir {
            if dir.exists() {
                for entry in fs::read_dir(dir)?.flatten() {
                    let path = entry.path();
                    if path.extension().is_none_or(|ext| ext != "json") {
                        continue;
                    }
                    let Ok(content) = fs::read_to_string(&path) else { continue };
                    let Ok(cached) = serde_json::from_str::<CacheEntry>(&content) else {
                        continue;
                    };
                    if cached.is_expired() {
                        let _ = fs::remove_file(&path);
                        removed += 1;
                    }
                }
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips_before_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(Some(dir.path()), None).unwrap();

        cache.set("k", &42u64, Some(Duration::from_secs(60))).unwrap();
        assert_eq!(cache.get::<u64>("k"), Some(42));
    }

    #[test]
    fn expired_entry_is_absent_and_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(Some(dir.path()), None).unwrap();

        cache.set("k", &"v".to_string(), Some(Duration::from_secs(0))).unwrap();
        // ttl=0 means created_at+ttl == created_at, so "now" is already past it once a
        // second ticks.
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(cache.get::<String>("k"), None);
    }

    #[test]
    fn make_key_is_deterministic_regardless_of_kwargs_insertion_order() {
        let k1 = Cache::make_key(&("source",), &serde_json::json!({"chain": 1, "addr": "0xabc"}));
        let k2 = Cache::make_key(&("source",), &serde_json::json!({"addr": "0xabc", "chain": 1}));
        assert_eq!(k1, k2);
    }

    #[test]
    fn delete_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(Some(dir.path()), None).unwrap();
        cache.set("k", &1u64, None).unwrap();
        cache.delete("k").unwrap();
        assert_eq!(cache.get::<u64>("k"), None);
    }

    #[test]
    fn cleanup_expired_counts_removed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(Some(dir.path()), None).unwrap();
        cache.set("fresh", &1u64, Some(Duration::from_secs(3600))).unwrap();
        cache.set("stale", &2u64, Some(Duration::from_secs(0))).unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        let removed = cache.cleanup_expired().unwrap();
        assert_eq!(removed, 1);
        assert_eq!(cache.get::<u64>("fresh"), Some(1));
    }
}
