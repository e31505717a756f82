//! Caller-side cancellation for API requests.
//!
//! An [`AbortController`] hands out cloneable [`AbortSignal`]s. Firing the controller
//! wakes every request waiting on one of its signals.

use tokio::sync::watch;

#[derive(Debug)]
pub struct AbortController {
    tx: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl Default for AbortController {
    fn default() -> Self { Self::new() }
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn signal(&self) -> AbortSignal { AbortSignal { rx: self.tx.subscribe() } }

    /// Idempotent.
    pub fn abort(&self) { self.tx.send_replace(true); }

    pub fn is_aborted(&self) -> bool { *self.tx.borrow() }
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool { *self.rx.borrow() }

    /// Resolves once the controller fires. If the controller is dropped without firing this
    /// never resolves, so a forgotten controller cannot cancel anything.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
