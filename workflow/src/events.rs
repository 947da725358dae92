use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

const CAPACITY: usize = 16;

/// Authentication state changes shared between collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    /// The backend rejected the bearer token; callers must sign in again.
    SessionExpired,
}

/// Typed broadcast bus for [`AuthEvent`]s.
///
/// Cloning the bus shares the same channel. Subscribers only see events
/// published after they subscribed, and stop seeing them once dropped.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<AuthEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CAPACITY);
        Self { tx }
    }

    /// Publish to every live subscriber. Returns how many received it.
    pub fn publish(&self, event: AuthEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription { rx: self.tx.subscribe() }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A live subscription; drop it or call [`unsubscribe`](Self::unsubscribe)
/// to stop receiving.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<AuthEvent>,
}

impl Subscription {
    /// Wait for the next event. `None` once every publisher is gone.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "auth event subscriber lagged"),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-published event, without waiting.
    pub fn try_next(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "auth event subscriber lagged"),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.clone().subscribe();

        assert_eq!(bus.publish(AuthEvent::SessionExpired), 2);
        assert_eq!(a.recv().await, Some(AuthEvent::SessionExpired));
        assert_eq!(b.try_next(), Some(AuthEvent::SessionExpired));
        assert_eq!(b.try_next(), None);
    }

    #[test]
    fn test_unsubscribe_and_late_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(AuthEvent::SessionExpired), 0);

        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        sub.unsubscribe();
        assert_eq!(bus.subscriber_count(), 0);

        let mut late = bus.subscribe();
        assert_eq!(late.try_next(), None);
    }
}
