//! Cooperative cancellation for blocking session I/O.
//!
//! A [`CancelSource`] is held by whoever may abort the request (a shutdown
//! handler, a client-disconnect watcher). Sessions hold a [`CancelToken`] and
//! poll it between write attempts and after every `EINTR`. The check is a
//! plain synchronous read of a `tokio::sync::watch` channel, so it works from
//! blocking threads with no runtime.

use tokio::sync::watch;

/// The sending half: flips every associated token to cancelled.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

/// The observing half handed to sessions. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Create a token observing this source.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// A token that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}

impl From<watch::Receiver<bool>> for CancelToken {
    /// Reuse an existing shutdown channel (`true` means shut down).
    fn from(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }
}
