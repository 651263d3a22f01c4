use core::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::PopRequest;
use crate::{Coordinator, KvStore, SleepProvider};

/// The pop actor. Serves [`PopRequest`]s one at a time until told to shut
/// down or until every sender is dropped.
pub(super) async fn popper_loop<S, P>(
    mut rx: mpsc::Receiver<PopRequest>,
    coordinator: Arc<Coordinator<S>>,
    _sleep: PhantomData<fn() -> P>,
) where
    S: KvStore,
    P: SleepProvider,
{
    #[cfg(feature = "tracing")]
    tracing::trace!(key = coordinator.queue().key(), "Pop actor started");

    while let Some(request) = rx.recv().await {
        match request {
            PopRequest::Pop { response } => {
                let result = coordinator.pop_code::<P>().await;
                if let Err(_unsent) = response.send(result) {
                    #[cfg(feature = "tracing")]
                    if let Ok(code) = _unsent {
                        tracing::warn!(%code, "caller went away after its code was committed");
                    }
                }
            }
            PopRequest::Shutdown { response } => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Pop actor received shutdown signal");

                if response.send(()).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Pop actor failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Pop actor stopped");
}
