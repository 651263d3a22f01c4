use core::{future::Future, time::Duration};

use crate::SleepProvider;

/// A [`SleepProvider`] backed by Tokio's timer.
///
/// This is the provider to use when serving real traffic.
pub struct TokioSleep;
impl SleepProvider for TokioSleep {
    fn sleep_for(dur: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(dur)
    }
}

/// A [`SleepProvider`] that yields to the scheduler instead of sleeping.
///
/// Retries happen as soon as the task is polled again, which keeps tests and
/// benchmarks fast but spins harder under real contention than
/// [`TokioSleep`].
pub struct TokioYield;
impl SleepProvider for TokioYield {
    fn sleep_for(_dur: Duration) -> impl Future<Output = ()> + Send {
        tokio::task::yield_now()
    }
}
