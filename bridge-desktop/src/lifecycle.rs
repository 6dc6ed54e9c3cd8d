//! Lifecycle observer for desktop hosts.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    lifecycle::{LifecycleChangeStream, LifecycleObserver, LifecycleState},
};
use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Desktop lifecycle observer.
///
/// Desktop processes have no OS-driven foreground notifications, so the
/// state starts in the foreground and only changes when the host window
/// layer calls [`DesktopLifecycleObserver::transition`].
pub struct DesktopLifecycleObserver {
    state: Mutex<LifecycleState>,
    sender: broadcast::Sender<LifecycleState>,
}

impl DesktopLifecycleObserver {
    /// Create a new lifecycle observer.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(LifecycleState::Foreground),
            sender,
        }
    }

    /// Record a lifecycle transition and notify subscribers.
    pub fn transition(&self, state: LifecycleState) {
        *self.state.lock() = state;
        // No subscribers is fine.
        let _ = self.sender.send(state);
    }
}

impl Default for DesktopLifecycleObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LifecycleObserver for DesktopLifecycleObserver {
    async fn get_state(&self) -> Result<LifecycleState> {
        Ok(*self.state.lock())
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn LifecycleChangeStream>> {
        Ok(Box::new(DesktopLifecycleChangeStream {
            receiver: self.sender.subscribe(),
        }))
    }
}

struct DesktopLifecycleChangeStream {
    receiver: broadcast::Receiver<LifecycleState>,
}

#[async_trait]
impl LifecycleChangeStream for DesktopLifecycleChangeStream {
    async fn next(&mut self) -> Option<LifecycleState> {
        loop {
            match self.receiver.recv().await {
                Ok(state) => return Some(state),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lifecycle_observer_starts_foreground() {
        let observer = DesktopLifecycleObserver::new();
        assert_eq!(
            observer.get_state().await.unwrap(),
            LifecycleState::Foreground
        );
    }

    #[tokio::test]
    async fn test_transitions_reach_subscribers() {
        let observer = DesktopLifecycleObserver::new();
        let mut stream = observer.subscribe_changes().await.unwrap();

        observer.transition(LifecycleState::Background);
        observer.transition(LifecycleState::Foreground);

        assert_eq!(stream.next().await, Some(LifecycleState::Background));
        assert_eq!(stream.next().await, Some(LifecycleState::Foreground));
        assert_eq!(
            observer.get_state().await.unwrap(),
            LifecycleState::Foreground
        );
    }
}
