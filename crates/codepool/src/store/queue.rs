#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{CodePool, DuplicateCode, KvStore, PutOutcome, StoreError, Version};

/// Number of read/write cycles [`QueueStore::replace`] makes before giving
/// up on a key that keeps changing underneath it.
const REPLACE_ATTEMPTS: usize = 16;

/// A pool as read from the store, with the version it was read at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub pool: CodePool,
    pub version: Version,
}

/// Adapter that keeps a [`CodePool`] as a JSON array under a single key.
///
/// The key is fixed at construction and handed in explicitly, so every
/// component that touches the pool does so through the same handle.
#[derive(Debug)]
pub struct QueueStore<S> {
    store: S,
    key: String,
}

impl<S> QueueStore<S>
where
    S: KvStore,
{
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads and decodes the pool.
    ///
    /// Returns `Ok(None)` if the key has never been written.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Malformed`] if the stored value is not a JSON array of
    ///   strings.
    /// - [`StoreError::Duplicate`] if the stored array repeats a code.
    /// - Any error raised by the underlying store.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self), fields(key = %self.key))
    )]
    pub async fn read(&self) -> Result<Option<Snapshot>, StoreError> {
        let Some(entry) = self.store.get(&self.key).await? else {
            return Ok(None);
        };
        let codes: Vec<String> =
            serde_json::from_slice(&entry.value).map_err(|source| StoreError::Malformed {
                key: self.key.clone(),
                source,
            })?;
        let pool = CodePool::new(codes).map_err(|DuplicateCode(code)| StoreError::Duplicate {
            key: self.key.clone(),
            code,
        })?;
        Ok(Some(Snapshot {
            pool,
            version: entry.version,
        }))
    }

    /// Encodes `pool` and writes it in full, provided the key is still at
    /// `expected` (`None` meaning the key must be absent).
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "trace",
            skip(self, pool),
            fields(key = %self.key, len = pool.len())
        )
    )]
    pub async fn write(
        &self,
        pool: &CodePool,
        expected: Option<Version>,
    ) -> Result<PutOutcome, StoreError> {
        let value = pool.to_json().map_err(|source| StoreError::Encode {
            key: self.key.clone(),
            source,
        })?;
        self.store.put(&self.key, value, expected).await
    }

    /// Overwrites whatever is stored at the key with `pool`.
    ///
    /// Meant for loading a pool before serving. A malformed or duplicated
    /// value at the key is replaced rather than reported.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the key keeps changing between
    /// the read and the write, or any error raised by the underlying store.
    pub async fn replace(&self, pool: &CodePool) -> Result<Version, StoreError> {
        for _ in 0..REPLACE_ATTEMPTS {
            let current = self.store.get(&self.key).await?.map(|entry| entry.version);
            match self.write(pool, current).await? {
                PutOutcome::Committed { version } => return Ok(version),
                PutOutcome::Conflict { .. } => continue,
            }
        }
        Err(StoreError::Unavailable {
            context: format!(
                "key `{}` changed during each of {REPLACE_ATTEMPTS} replace attempts",
                self.key
            ),
        })
    }
}
