//! Error types for reading, writing and popping the code pool.
//!
//! - [`StoreError`]: a round trip to the backing store failed, or the value
//!   it returned could not be decoded into a valid pool.
//! - [`PopError`]: the terminal outcome of a failed pop.
//! - [`DuplicateCode`]: a pool was built from a list that repeats a code.

/// A result type defaulting to [`PopError`].
pub type Result<T, E = PopError> = core::result::Result<T, E>;

/// Failures surfaced by a [`KvStore`](crate::KvStore) or by the
/// [`QueueStore`](crate::QueueStore) adapter on top of it.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// The backing store could not be reached or refused the operation.
    #[error("store unavailable: {context}")]
    Unavailable { context: String },

    /// The value stored under `key` is not a JSON array of strings.
    ///
    /// This is never treated as an empty pool.
    #[error("malformed pool at key `{key}`: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The value stored under `key` lists `code` more than once.
    ///
    /// Dispensing from such a pool would hand the same code to two callers,
    /// so it is refused like any other malformed value.
    #[error("pool at key `{key}` lists code `{code}` more than once")]
    Duplicate { key: String, code: String },

    /// The pool could not be encoded before writing it back.
    #[error("failed to encode pool for key `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a pop did not return a code.
///
/// Every variant is terminal for a single pop; no partial state is exposed.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum PopError {
    /// The pool is absent or has no codes left.
    #[error("No codes left")]
    Empty,

    /// The store failed or held a malformed or duplicated value.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Every attempt lost its conditional write to a concurrent pop.
    ///
    /// The pool was left untouched by this caller, so retrying the whole
    /// request is safe.
    #[error("lost the race for the pool after {attempts} attempts")]
    RaceLost { attempts: u32 },

    /// The serializing popper no longer accepts requests.
    #[error("pop service is shutting down")]
    Shutdown,
}

impl PopError {
    /// Whether the caller may retry the same request later.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::RaceLost { .. } | Self::Shutdown)
    }
}

/// A code appeared more than once while building a [`CodePool`](crate::CodePool).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("code `{0}` appears more than once in the pool")]
pub struct DuplicateCode(pub String);
