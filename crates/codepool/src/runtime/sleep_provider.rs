use core::{future::Future, time::Duration};

/// Abstracts how a pop waits out its backoff between attempts, so the
/// coordinator is not tied to one async runtime.
pub trait SleepProvider {
    /// The returned future must be `Send` so pops can run on multi-threaded
    /// executors.
    fn sleep_for(dur: Duration) -> impl Future<Output = ()> + Send;
}
