//! In-memory bookkeeping for conversation threads.
//!
//! One entry per thread created through this process. Nothing is persisted;
//! the table starts empty on every restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata tracked for a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadRecord {
    pub created_at: DateTime<Utc>,
    pub message_count: u64,
    pub last_message_at: Option<DateTime<Utc>>,
}

/// Thread table keyed by upstream thread id.
#[derive(Debug, Default)]
pub struct ThreadRegistry {
    threads: Mutex<HashMap<String, ThreadRecord>>,
}

impl ThreadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ThreadRecord>> {
        self.threads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start tracking a newly created thread.
    pub fn register(&self, thread_id: &str) {
        self.lock().insert(
            thread_id.to_string(),
            ThreadRecord {
                created_at: Utc::now(),
                message_count: 0,
                last_message_at: None,
            },
        );
    }

    /// Count a delivered reply. Returns `false` for threads this process
    /// never created; those are left untracked.
    pub fn record_reply(&self, thread_id: &str) -> bool {
        match self.lock().get_mut(thread_id) {
            Some(record) => {
                record.message_count += 1;
                record.last_message_at = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    pub fn get(&self, thread_id: &str) -> Option<ThreadRecord> {
        self.lock().get(thread_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_starts_empty_record() {
        let registry = ThreadRegistry::new();
        registry.register("thread_1");

        let record = registry.get("thread_1").unwrap();
        assert_eq!(record.message_count, 0);
        assert!(record.last_message_at.is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_record_reply_updates_stats() {
        let registry = ThreadRegistry::new();
        registry.register("thread_1");

        assert!(registry.record_reply("thread_1"));
        assert!(registry.record_reply("thread_1"));

        let record = registry.get("thread_1").unwrap();
        assert_eq!(record.message_count, 2);
        let last = record.last_message_at.unwrap();
        assert!(last >= record.created_at);
    }

    #[test]
    fn test_record_reply_unknown_thread_is_ignored() {
        let registry = ThreadRegistry::new();
        assert!(!registry.record_reply("thread_elsewhere"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_independent_registries() {
        let a = ThreadRegistry::new();
        let b = ThreadRegistry::new();
        a.register("thread_1");
        assert!(b.get("thread_1").is_none());
    }
}
