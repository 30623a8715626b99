//! In-memory nullable key-value store with injectable outages.

use async_trait::async_trait;
use inverse_store::{KvStore, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// An in-memory [`KvStore`] for testing.
///
/// Reads and writes can be switched to fail independently, and every
/// operation is counted so tests can assert on cache traffic.
#[derive(Default)]
pub struct NullKvStore {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl NullKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read fail as if the store were unreachable.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write and delete fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the store entirely unreachable.
    pub fn go_down(&self) {
        self.fail_reads(true);
        self.fail_writes(true);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw stored value, bypassing failure injection and counters.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Seed a raw value, bypassing failure injection and counters.
    pub fn put_raw(&self, key: &str, value: impl Into<String>) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.into());
    }
}

#[async_trait]
impl KvStore for NullKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("null store is down".into()));
        }
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("null store is down".into()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("null store is down".into()));
        }
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
