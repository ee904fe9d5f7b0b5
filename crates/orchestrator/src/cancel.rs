//! Cooperative cancellation for provisioning runs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use uuid::Uuid;

/// Owner side of a cancellation flag. Cloning shares the flag.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            receiver: Some(self.sender.subscribe()),
        }
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side handed to the provisioner and every phase.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        Self { receiver: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.receiver.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is requested. Pends forever if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&self) {
        let Some(receiver) = &self.receiver else {
            return std::future::pending().await;
        };

        let mut receiver = receiver.clone();
        let sender_dropped = receiver.wait_for(|cancelled| *cancelled).await.is_err();
        if sender_dropped {
            std::future::pending::<()>().await;
        }
    }
}

/// Per-invocation context: identity, cancellation and deadline override.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: Uuid,
    cancel: CancelSignal,
    phase_timeout: Option<Duration>,
}

impl RunContext {
    pub fn new(cancel: CancelSignal) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            cancel,
            phase_timeout: None,
        }
    }

    /// Apply one deadline to every phase instead of each phase's own.
    pub fn with_phase_timeout(mut self, timeout: Duration) -> Self {
        self.phase_timeout = Some(timeout);
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn cancel(&self) -> &CancelSignal {
        &self.cancel
    }

    pub fn phase_timeout(&self) -> Option<Duration> {
        self.phase_timeout
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(CancelSignal::never())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_fires_after_cancel() {
        let handle = CancellationHandle::new();
        let signal = handle.signal();
        assert!(!signal.is_cancelled());

        let waiter = tokio::spawn({
            let signal = signal.clone();
            async move { signal.cancelled().await }
        });

        handle.cancel();
        waiter.await.unwrap();
        assert!(signal.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn test_signal_created_after_cancel() {
        let handle = CancellationHandle::new();
        handle.cancel();

        let signal = handle.signal();
        assert!(signal.is_cancelled());
        signal.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_does_not_fire() {
        let signal = CancelSignal::never();
        let result =
            tokio::time::timeout(Duration::from_secs(3600), signal.cancelled()).await;
        assert!(result.is_err());
        assert!(!signal.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_does_not_fire() {
        let signal = CancellationHandle::new().signal();
        let result = tokio::time::timeout(Duration::from_secs(60), signal.cancelled()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_run_context() {
        let ctx = RunContext::default().with_phase_timeout(Duration::from_secs(5));
        assert_eq!(ctx.phase_timeout(), Some(Duration::from_secs(5)));
        assert!(!ctx.cancel().is_cancelled());
        assert!(!ctx.run_id().is_nil());
    }
}
