//! Fan-out of run events to the console and the run log.
//!
//! The provisioner publishes envelopes already numbered by its ordered
//! emitter, so observers can detect a gap from `sequence` alone. A slow
//! observer skips ahead; it never holds up a phase.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use uuid::Uuid;

use crate::types::{Event, EventEnvelope};

/// A full provisioning run emits a few dozen events at most
const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    published: Arc<AtomicUsize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns how many observers received the envelope. Zero is not an
    /// error; a run without observers still provisions.
    pub fn publish(&self, envelope: EventEnvelope) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.sender.send(envelope).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Follow one run from now until its `RunFinished`.
    pub fn observe_run(&self, run_id: Uuid) -> RunObserver {
        RunObserver {
            run_id,
            rx: self.sender.subscribe(),
            finished: false,
            skipped: 0,
        }
    }

    pub fn observers(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Envelopes published so far, observed or not
    pub fn published(&self) -> usize {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Events of a single run, ending after its `RunFinished`.
///
/// Other runs sharing the bus are filtered out. Lag is logged and counted
/// rather than surfaced, since the step events that were dropped are also in
/// the run log.
pub struct RunObserver {
    run_id: Uuid,
    rx: broadcast::Receiver<EventEnvelope>,
    finished: bool,
    skipped: u64,
}

impl RunObserver {
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        if self.finished {
            return None;
        }
        loop {
            match self.rx.recv().await {
                Ok(envelope) if envelope.event.run_id() != self.run_id => continue,
                Ok(envelope) => {
                    self.finished = matches!(envelope.event, Event::RunFinished { .. });
                    return Some(envelope);
                }
                Err(RecvError::Lagged(n)) => {
                    warn!(run_id = %self.run_id, skipped = n, "Run observer fell behind");
                    self.skipped += n;
                }
                Err(RecvError::Closed) => {
                    self.finished = true;
                    return None;
                }
            }
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Envelopes of any run dropped because this observer lagged
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Event, RunOutcome};
    use uuid::Uuid;

    fn step(run_id: Uuid, phase: &str) -> EventEnvelope {
        EventEnvelope::new(Event::StepStarted {
            run_id,
            phase: phase.to_string(),
            title: phase.to_string(),
            estimated_minutes: 1,
        })
    }

    #[tokio::test]
    async fn test_observer_sees_run_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let run_id = Uuid::new_v4();

        for phase in ["validate", "create-cluster", "install-argocd"] {
            assert_eq!(bus.publish(step(run_id, phase)), 1);
        }
        bus.publish(EventEnvelope::new(Event::RunFinished {
            run_id,
            outcome: RunOutcome::Completed,
            elapsed_ms: 5,
        }));

        let mut phases = Vec::new();
        loop {
            let envelope = rx.recv().await.unwrap();
            assert_eq!(envelope.event.run_id(), run_id);
            match envelope.event.phase() {
                Some(phase) => phases.push(phase.to_string()),
                None => break,
            }
        }
        assert_eq!(phases, vec!["validate", "create-cluster", "install-argocd"]);
    }

    #[tokio::test]
    async fn test_every_observer_gets_a_copy() {
        let bus = EventBus::new();
        let mut console = bus.subscribe();
        let mut log = bus.subscribe();

        let envelope = step(Uuid::new_v4(), "install-vault");
        assert_eq!(bus.publish(envelope.clone()), 2);

        assert_eq!(console.recv().await.unwrap().id, envelope.id);
        assert_eq!(log.recv().await.unwrap().id, envelope.id);
    }

    #[tokio::test]
    async fn test_slow_observer_lags_instead_of_blocking() {
        let bus = EventBus::with_capacity(2);
        let mut rx = bus.subscribe();
        let run_id = Uuid::new_v4();

        for phase in ["validate", "create-cluster", "install-argocd"] {
            bus.publish(step(run_id, phase));
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert_eq!(
            rx.recv().await.unwrap().event.phase(),
            Some("create-cluster")
        );
    }

    #[test]
    fn test_unobserved_events_are_counted_and_dropped() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(step(Uuid::new_v4(), "validate")), 0);
        assert_eq!(bus.published(), 1);

        let clone = bus.clone();
        let _rx = clone.subscribe();
        assert_eq!(bus.observers(), 1);
    }

    #[tokio::test]
    async fn test_run_observer_ignores_other_runs_and_stops_at_finish() {
        let bus = EventBus::new();
        let run_id = Uuid::new_v4();
        let mut observer = bus.observe_run(run_id);

        bus.publish(step(Uuid::new_v4(), "create-cluster"));
        bus.publish(step(run_id, "validate"));
        bus.publish(EventEnvelope::new(Event::RunFinished {
            run_id,
            outcome: RunOutcome::Halted {
                phase: "validate".to_string(),
            },
            elapsed_ms: 1,
        }));
        bus.publish(step(run_id, "install-argocd"));

        assert_eq!(observer.next().await.unwrap().event.phase(), Some("validate"));
        assert!(matches!(
            observer.next().await.unwrap().event,
            Event::RunFinished { .. }
        ));
        assert!(observer.next().await.is_none());
        assert_eq!(observer.skipped(), 0);
    }

    #[tokio::test]
    async fn test_run_observer_counts_lag_and_keeps_going() {
        let bus = EventBus::with_capacity(2);
        let run_id = Uuid::new_v4();
        let mut observer = bus.observe_run(run_id);

        for phase in ["validate", "create-cluster", "install-argocd"] {
            bus.publish(step(run_id, phase));
        }

        assert_eq!(
            observer.next().await.unwrap().event.phase(),
            Some("create-cluster")
        );
        assert_eq!(observer.skipped(), 1);
    }

    #[tokio::test]
    async fn test_run_observer_ends_when_bus_dropped() {
        let bus = EventBus::new();
        let mut observer = bus.observe_run(Uuid::new_v4());
        drop(bus);
        assert!(observer.next().await.is_none());
    }
}
