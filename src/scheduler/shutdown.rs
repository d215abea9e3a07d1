use thiserror::Error;
use tokio::sync::watch;

/// Control value handed back by a wait that was interrupted by shutdown.
/// Not a failure, callers are expected to stop what they were doing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("wait cancelled by shutdown")]
pub struct Cancelled;

/// Owning side of the shutdown flag. Dropping it counts as triggering.
#[derive(Debug)]
pub struct Shutdown(watch::Sender<bool>);

/// Cloneable view of the shutdown flag handed to every waiter
#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl Shutdown {
    pub fn new() -> (Self, ShutdownSignal) {
        let (tx, rx) = watch::channel(false);
        (Self(tx), ShutdownSignal(rx))
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal(self.0.subscribe())
    }

    pub fn trigger(&self) {
        // send_replace doesn't care whether anyone is still listening
        self.0.send_replace(true);
    }
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once shutdown has been requested
    pub async fn triggered(&self) {
        let mut rx = self.0.clone();
        // an Err means the sender is gone which is as good as a trigger
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::Shutdown;

    #[tokio::test]
    async fn trigger_wakes_every_signal() {
        let (shutdown, signal) = Shutdown::new();
        let other = shutdown.signal();
        assert!(!signal.is_triggered());

        let waiter = tokio::spawn(async move { other.triggered().await });
        shutdown.trigger();

        timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter hung after trigger")
            .unwrap();
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn dropped_sender_counts_as_triggered() {
        let (shutdown, signal) = Shutdown::new();
        drop(shutdown);
        timeout(Duration::from_secs(1), signal.triggered())
            .await
            .expect("signal hung after sender dropped");
    }
}
