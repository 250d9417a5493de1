//! Job-scoped memoization of judge verdicts keyed by content hash.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;

use crate::types::JudgeVerdict;

/// SHA-256 over the old and new texts of an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentKey([u8; 32]);

impl ContentKey {
    pub fn of(old_text: &str, new_text: &str) -> Self {
        let mut hasher = Sha256::new();
        // Length prefixes keep ("ab", "c") and ("a", "bc") apart.
        hasher.update((old_text.len() as u64).to_le_bytes());
        hasher.update(old_text.as_bytes());
        hasher.update((new_text.len() as u64).to_le_bytes());
        hasher.update(new_text.as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Verdict memo shared by the workers of one compare job.
///
/// Each key owns a [`OnceCell`], so concurrent requests for the same edit
/// wait on a single judge call. A cell is only filled by a successful
/// verdict; failures leave it empty for the next caller.
#[derive(Debug, Default)]
pub struct JudgeCache {
    entries: Mutex<HashMap<ContentKey, Arc<OnceCell<JudgeVerdict>>>>,
}

impl JudgeCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ContentKey, Arc<OnceCell<JudgeVerdict>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cell for `key`, created empty on first use.
    pub fn slot(&self, key: ContentKey) -> Arc<OnceCell<JudgeVerdict>> {
        Arc::clone(self.lock().entry(key).or_default())
    }

    /// Memoized verdict, if one has been stored.
    pub fn get(&self, key: &ContentKey) -> Option<JudgeVerdict> {
        self.lock().get(key).and_then(|cell| cell.get().cloned())
    }

    /// Number of memoized verdicts.
    pub fn len(&self) -> usize {
        self.lock().values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImpactLevel;

    #[test]
    fn key_is_stable_and_order_sensitive() {
        let a = ContentKey::of("old", "new");
        assert_eq!(a, ContentKey::of("old", "new"));
        assert_ne!(a, ContentKey::of("new", "old"));
        assert_ne!(ContentKey::of("ab", "c"), ContentKey::of("a", "bc"));
        assert_eq!(a.to_hex().len(), 64);
        assert_eq!(a.to_string(), a.to_hex());
    }

    #[tokio::test]
    async fn only_filled_slots_count() {
        let cache = JudgeCache::new();
        let key = ContentKey::of("x", "y");
        let slot = cache.slot(key);
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());

        let _ = slot
            .get_or_try_init(|| async { Err::<JudgeVerdict, ()>(()) })
            .await;
        assert!(cache.is_empty());

        let verdict = JudgeVerdict::new(ImpactLevel::Low, "typo", 0.9);
        slot.get_or_init(|| async { verdict.clone() }).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key), Some(verdict));
        assert!(Arc::ptr_eq(&slot, &cache.slot(key)));
    }
}
