use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::errors::CacheError;

/// Key-value byte store with per-entry expiration.
///
/// Implementations must be safe to share between threads. Every method may
/// fail; callers treat failure as a miss.
#[cfg_attr(test, mockall::automock)]
pub trait CacheBackend: Send + Sync {
    /// Fetch every present, unexpired key. Missing keys are simply absent
    /// from the result.
    fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>, CacheError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Default largest value the in-memory backend accepts (1 MiB).
const DEFAULT_MAX_ITEM_SIZE: usize = 1024 * 1024;

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process [`CacheBackend`] backed by a `HashMap`.
///
/// Expired entries are dropped when read and swept on every write.
pub struct MemoryCacheBackend {
    entries: Mutex<HashMap<String, Entry>>,
    max_item_size: usize,
}

impl Default for MemoryCacheBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCacheBackend {
    /// Empty cache with a 1 MiB item limit.
    pub fn new() -> Self {
        Self::with_max_item_size(DEFAULT_MAX_ITEM_SIZE)
    }

    /// Empty cache refusing values larger than `max_item_size`.
    pub fn with_max_item_size(max_item_size: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_item_size,
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl CacheBackend for MemoryCacheBackend {
    fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            let expired = match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    let _ = found.insert(key.clone(), entry.value.clone());
                    false
                }
                Some(_) => true,
                None => false,
            };
            if expired {
                let _ = entries.remove(key);
            }
        }
        Ok(found)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        if value.len() > self.max_item_size {
            return Err(CacheError::TooLarge {
                key: key.to_owned(),
                size: value.len(),
            });
        }
        let now = Instant::now();
        let entry = Entry {
            value: value.to_vec(),
            expires_at: now + ttl,
        };
        let mut entries = self.entries.lock();
        entries.retain(|_, e| e.expires_at > now);
        let _ = entries.insert(key.to_owned(), entry);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let _ = self.entries.lock().remove(key);
        Ok(())
    }
}
