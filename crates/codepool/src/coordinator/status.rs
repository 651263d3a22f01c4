use crate::Version;

/// The outcome of a single pop attempt.
///
/// - [`PopStatus::Ready`]: the remainder was committed and `code` now belongs
///   to the caller.
/// - [`PopStatus::Conflict`]: another writer changed the pool between the
///   read and the conditional write. Nothing was consumed; the attempt may be
///   repeated from a fresh read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PopStatus {
    Ready {
        /// The dispensed code.
        code: String,
    },
    Conflict {
        /// The version the attempt read and tried to write against.
        read_at: Version,
    },
}
