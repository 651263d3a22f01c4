use crate::server::config::{ServerConfig, Strategy};
use codepool::{Coordinator, KvStore, MemoryStore, SerialPopper, TokioSleep};
use std::sync::Arc;

/// Backing store used by the server.
///
/// The pool lives in process memory; every pop still goes through the
/// versioned read/conditional-write contract of [`KvStore`].
pub type Store = MemoryStore;

/// The pop strategy shared by all request handlers.
pub enum Dispenser<S = Store> {
    /// Handlers pop directly and retry on conflicting writes.
    Optimistic(Arc<Coordinator<S>>),
    /// Handlers hand their pops to a single actor task.
    Serial(SerialPopper),
}

impl<S> Clone for Dispenser<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Optimistic(coordinator) => Self::Optimistic(Arc::clone(coordinator)),
            Self::Serial(popper) => Self::Serial(popper.clone()),
        }
    }
}

impl<S> Dispenser<S>
where
    S: KvStore + 'static,
{
    /// Wraps `coordinator` according to the configured strategy. With
    /// [`Strategy::Serial`] this spawns the pop actor.
    pub fn new(coordinator: Arc<Coordinator<S>>, config: &ServerConfig) -> Self {
        match config.strategy {
            Strategy::Optimistic => Self::Optimistic(coordinator),
            Strategy::Serial => Self::Serial(SerialPopper::spawn::<S, TokioSleep>(
                coordinator,
                config.serial_buffer_size,
                config.shutdown_timeout,
            )),
        }
    }

    pub async fn pop_code(&self) -> codepool::Result<String> {
        match self {
            Self::Optimistic(coordinator) => coordinator.pop_code::<TokioSleep>().await,
            Self::Serial(popper) => popper.pop_code().await,
        }
    }

    /// Drains the pop actor, if there is one.
    pub async fn shutdown(&self) {
        if let Self::Serial(popper) = self {
            popper.shutdown().await;
        }
    }
}
