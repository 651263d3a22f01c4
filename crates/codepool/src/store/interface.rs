use core::{fmt, future::Future};
use std::sync::Arc;

use bytes::Bytes;

use crate::StoreError;

/// Opaque version stamp attached by the store to every committed value.
///
/// Versions are only compared for equality by callers; stores are free to
/// pick any monotonic scheme (a counter, an etag, a generation number).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(u64);

impl Version {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A value read from the store together with its current version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub value: Bytes,
    pub version: Version,
}

/// Result of a conditional [`KvStore::put`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    /// The value was written and now carries `version`.
    Committed { version: Version },
    /// The key changed since it was read; nothing was written.
    ///
    /// `current` is the version found at the key (`None` if absent).
    Conflict { current: Option<Version> },
}

impl PutOutcome {
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// A key-value store offering whole-value get and conditional put.
///
/// This is the only primitive the pop coordinator relies on. A store with a
/// native compare-and-swap (etag preconditions, generation matches, `WATCH`
/// and friends) maps onto it directly.
///
/// Every call is one round trip; there is no batching and no partial write.
pub trait KvStore: Send + Sync {
    /// Fetches the value at `key`, or `None` if it was never written.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Entry>, StoreError>> + Send;

    /// Replaces the value at `key` if its version still matches `expected`.
    ///
    /// `expected == None` requires the key to be absent.
    fn put(
        &self,
        key: &str,
        value: Bytes,
        expected: Option<Version>,
    ) -> impl Future<Output = Result<PutOutcome, StoreError>> + Send;
}

impl<S> KvStore for Arc<S>
where
    S: KvStore,
{
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Entry>, StoreError>> + Send {
        (**self).get(key)
    }

    fn put(
        &self,
        key: &str,
        value: Bytes,
        expected: Option<Version>,
    ) -> impl Future<Output = Result<PutOutcome, StoreError>> + Send {
        (**self).put(key, value, expected)
    }
}
