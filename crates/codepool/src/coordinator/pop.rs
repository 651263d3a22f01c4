#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    KvStore, PopError, PopStatus, PutOutcome, QueueStore, Result, RetryPolicy, SleepProvider,
    Snapshot,
};

/// Pops codes from a [`QueueStore`] with optimistic concurrency control.
///
/// A pop reads the pool and its version, splits off the head, and writes the
/// remainder back only if the version is unchanged. If another pop committed
/// first, the write is rejected, nothing is consumed, and the cycle restarts
/// from a fresh read after a jittered backoff. A code is therefore handed out
/// by at most one committed write.
///
/// The coordinator holds no pool state of its own; any number of
/// coordinators, in any number of processes, may share the same key.
#[derive(Debug)]
pub struct Coordinator<S> {
    queue: QueueStore<S>,
    policy: RetryPolicy,
}

impl<S> Coordinator<S>
where
    S: KvStore,
{
    pub const fn new(queue: QueueStore<S>, policy: RetryPolicy) -> Self {
        Self { queue, policy }
    }

    pub const fn queue(&self) -> &QueueStore<S> {
        &self.queue
    }

    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Makes a single pop attempt.
    ///
    /// # Returns
    ///
    /// - `Ok(PopStatus::Ready { code })`: the remainder was committed.
    /// - `Ok(PopStatus::Conflict { .. })`: the pool moved underneath this
    ///   attempt; nothing was consumed.
    ///
    /// # Errors
    ///
    /// - [`PopError::Empty`] if the pool is absent or empty.
    /// - [`PopError::Store`] if either round trip fails or the stored value is
    ///   malformed.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self), fields(key = %self.queue.key()))
    )]
    pub async fn try_pop(&self) -> Result<PopStatus> {
        let Some(Snapshot { pool, version }) = self.queue.read().await? else {
            return Err(PopError::Empty);
        };
        let Some((code, remainder)) = pool.split_head() else {
            return Err(PopError::Empty);
        };

        match self.queue.write(&remainder, Some(version)).await? {
            PutOutcome::Committed { .. } => Ok(PopStatus::Ready { code }),
            PutOutcome::Conflict { .. } => Ok(PopStatus::Conflict { read_at: version }),
        }
    }

    /// Pops the head of the pool, retrying conflicting attempts according to
    /// the [`RetryPolicy`] and sleeping through `P` between them.
    ///
    /// Each retry re-reads the pool, so the code returned is always the
    /// earliest inserted code still present when the winning attempt read.
    ///
    /// # Errors
    ///
    /// - [`PopError::Empty`] if the pool is absent or empty.
    /// - [`PopError::Store`] on any store fault. Faults are not retried.
    /// - [`PopError::RaceLost`] once every attempt has conflicted.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self), fields(key = %self.queue.key()))
    )]
    pub async fn pop_code<P>(&self) -> Result<String>
    where
        P: SleepProvider,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let _read_at = match self.try_pop().await? {
                PopStatus::Ready { code } => return Ok(code),
                PopStatus::Conflict { read_at } => read_at,
            };

            if attempt >= self.policy.max_attempts() {
                #[cfg(feature = "tracing")]
                tracing::warn!(attempt, read_at = %_read_at, "giving up on contended pool");
                return Err(PopError::RaceLost { attempts: attempt });
            }

            let delay = self.policy.backoff(attempt);
            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, read_at = %_read_at, ?delay, "write conflict, backing off");
            P::sleep_for(delay).await;
        }
    }
}
