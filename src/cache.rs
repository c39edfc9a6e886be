//! Process-wide response cache — memoizes backend answers by query text.
//!
//! Entries are keyed per `(backend, normalized question)` and expire purely
//! by TTL; nothing ever invalidates them explicitly. Error-text answers are
//! cached exactly like successes — the cache does not inspect result quality.
//!
//! Concurrent calls for the same key are not deduplicated: `compute` runs
//! outside the lock, and the last writer wins. Backend calls are idempotent
//! reads, so a duplicate in-flight call is wasted work, not a correctness
//! problem.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::backends::{AnswerResult, BackendKind};

struct CacheEntry {
    answer: AnswerResult,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

pub struct ResponseCache {
    entries: Mutex<HashMap<(BackendKind, String), CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Return the cached answer for `(kind, question)` if present and fresh;
    /// otherwise run `compute`, store its result, and return it.
    ///
    /// The lock is held only for map access — never across `.await`.
    pub async fn get_or_compute<F, Fut>(
        &self,
        kind: BackendKind,
        question: &str,
        compute: F,
    ) -> AnswerResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AnswerResult>,
    {
        let key = (kind, normalize(question));

        if let Some(hit) = self.lookup(&key) {
            return hit;
        }

        let answer = compute().await;

        let mut entries = self.lock();
        entries.insert(
            key,
            CacheEntry {
                answer: answer.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        answer
    }

    /// Fresh entry for `key`, removing it when expired.
    fn lookup(&self, key: &(BackendKind, String)) -> Option<AnswerResult> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.answer.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(BackendKind, String), CacheEntry>> {
        // A poisoned lock only means a panic elsewhere mid-insert; the map
        // itself is still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Cache key normalization: whitespace-trimmed, lower-cased question text.
fn normalize(question: &str) -> String {
    question.trim().to_lowercase()
}
