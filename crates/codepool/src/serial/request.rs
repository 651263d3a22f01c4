use tokio::sync::oneshot;

use crate::Result;

/// A message for the pop actor.
#[derive(Debug)]
pub enum PopRequest {
    /// Pop one code and reply on `response`.
    ///
    /// If the caller has gone away by the time the pop commits, the code is
    /// consumed all the same.
    Pop {
        response: oneshot::Sender<Result<String>>,
    },

    /// Stop after every request queued before this one has been served, then
    /// acknowledge on `response`.
    Shutdown { response: oneshot::Sender<()> },
}
