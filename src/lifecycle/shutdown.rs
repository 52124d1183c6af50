//! Shutdown coordination.

use std::sync::Arc;

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Cloning shares the same channel: any clone may trigger, every subscriber
/// is woken. The triggered state is sticky, so a subscriber created after
/// `trigger` still observes it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Number of live subscriptions.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half handed to tasks that must stop on shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once shutdown has been triggered, immediately if it already
    /// was.
    pub async fn recv(&mut self) {
        // An error means every `Shutdown` handle is gone; nobody is left to
        // trigger, so treat it as shutdown too.
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_wakes_every_subscriber() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.clone().subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        a.recv().await;
        b.recv().await;
        assert!(a.is_triggered() && b.is_triggered());
    }

    #[tokio::test]
    async fn late_subscriber_still_sees_shutdown() {
        let shutdown = Shutdown::new();
        let early = shutdown.subscribe();
        shutdown.trigger();

        let mut late = shutdown.subscribe();
        let mut cloned = early.clone();
        tokio::time::timeout(Duration::from_secs(1), late.recv())
            .await
            .expect("subscriber created after trigger must resolve");
        tokio::time::timeout(Duration::from_secs(1), cloned.recv())
            .await
            .expect("clone of an existing subscriber must resolve");
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn untriggered_signal_stays_pending() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        let waited = tokio::time::timeout(Duration::from_millis(20), signal.recv()).await;
        assert!(waited.is_err());
        assert!(!signal.is_triggered());
    }

    #[test]
    fn trigger_without_subscribers_is_harmless() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        assert!(shutdown.is_triggered());
    }
}
