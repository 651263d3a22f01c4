//! Serialized pops through a single actor task.
//!
//! [`SerialPopper`] funnels every pop issued by this process through one
//! task that owns a [`Coordinator`]. Pops from the same process are thereby
//! linearized and never conflict with one another; the coordinator's
//! conditional writes still guard the pool against other processes sharing
//! the key.

mod request;
mod worker;

use core::{marker::PhantomData, time::Duration};
use std::sync::Arc;

use tokio::{
    sync::{mpsc, oneshot},
    time::timeout,
};
use tokio_util::sync::CancellationToken;

pub use request::PopRequest;
use worker::popper_loop;

use crate::{Coordinator, KvStore, PopError, Result, SleepProvider};

/// Handle to a pop actor. Cheap to clone; all clones feed the same actor.
#[derive(Clone, Debug)]
pub struct SerialPopper {
    tx: mpsc::Sender<PopRequest>,
    shutdown_token: CancellationToken,
    shutdown_timeout: Duration,
}

impl SerialPopper {
    /// Spawns the actor on the current Tokio runtime.
    ///
    /// `buffer` bounds how many pop requests may wait for the actor before
    /// callers are back-pressured (at least one). `shutdown_timeout` bounds
    /// how long [`SerialPopper::shutdown`] waits for queued pops to drain.
    pub fn spawn<S, P>(
        coordinator: Arc<Coordinator<S>>,
        buffer: usize,
        shutdown_timeout: Duration,
    ) -> Self
    where
        S: KvStore + 'static,
        P: SleepProvider + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        tokio::spawn(popper_loop::<S, P>(rx, coordinator, PhantomData));
        Self {
            tx,
            shutdown_token: CancellationToken::new(),
            shutdown_timeout,
        }
    }

    /// Pops a code through the actor.
    ///
    /// # Errors
    ///
    /// Every error of [`Coordinator::pop_code`], plus [`PopError::Shutdown`]
    /// once [`SerialPopper::shutdown`] has been called or the actor is gone.
    pub async fn pop_code(&self) -> Result<String> {
        if self.shutdown_token.is_cancelled() {
            return Err(PopError::Shutdown);
        }

        let (response, rx) = oneshot::channel();
        self.tx
            .send(PopRequest::Pop { response })
            .await
            .map_err(|_| PopError::Shutdown)?;
        rx.await.map_err(|_| PopError::Shutdown)?
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Stops accepting pops, lets the actor finish the ones already queued,
    /// and waits up to the shutdown timeout for it to acknowledge.
    pub async fn shutdown(&self) {
        #[cfg(feature = "tracing")]
        tracing::info!("Refusing new pops");
        self.shutdown_token.cancel();

        let (response, ack) = oneshot::channel();
        if let Err(_e) = self.tx.send(PopRequest::Shutdown { response }).await {
            #[cfg(feature = "tracing")]
            tracing::debug!("Pop actor already stopped: {_e}");
            return;
        }

        match timeout(self.shutdown_timeout, ack).await {
            Ok(Ok(())) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Pop actor shutdown acknowledged");
            }
            Ok(Err(_e)) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Pop actor dropped its shutdown acknowledgement: {_e}");
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Pop actor shutdown timed out");
            }
        }
    }
}
