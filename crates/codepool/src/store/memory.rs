use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::Mutex;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Entry, KvStore, PutOutcome, StoreError, Version};

/// An in-process [`KvStore`].
///
/// All keys share one version counter, so a version is never reused even
/// across keys. Reads and conditional writes are linearized by a single
/// mutex that is never held across an await point.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    clock: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_sync(&self, key: &str) -> Option<Entry> {
        self.state.lock().entries.get(key).cloned()
    }

    fn put_sync(&self, key: &str, value: Bytes, expected: Option<Version>) -> PutOutcome {
        let mut state = self.state.lock();
        let current = state.entries.get(key).map(|entry| entry.version);
        if current != expected {
            return PutOutcome::Conflict { current };
        }

        state.clock += 1;
        let version = Version::new(state.clock);
        state
            .entries
            .insert(key.to_owned(), Entry { value, version });
        PutOutcome::Committed { version }
    }
}

impl KvStore for MemoryStore {
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    async fn get(&self, key: &str) -> Result<Option<Entry>, StoreError> {
        Ok(self.get_sync(key))
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self, value), fields(len = value.len()))
    )]
    async fn put(
        &self,
        key: &str,
        value: Bytes,
        expected: Option<Version>,
    ) -> Result<PutOutcome, StoreError> {
        Ok(self.put_sync(key, value, expected))
    }
}
