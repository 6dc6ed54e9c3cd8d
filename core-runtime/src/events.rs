//! # Event Bus System
//!
//! Delivers the bridge's canonical events to the host application.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: [`CoreEvent`] with the two host-visible events,
//!   `playbackStateDidChange` and `authorizationStatusDidChange`
//! - **EventBus**: a `tokio::sync::broadcast` channel plus a listener registry
//! - **ListenerHandle**: disposable handle returned by
//!   [`EventBus::add_listener`] for symmetric removal
//! - **EventStream**: wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   emit   ┌───────────────┐   callback   ┌──────────┐
//! │ Source adapter ├─────────>│               ├─────────────>│ Listener │
//! └────────────────┘          │   EventBus    │              └──────────┘
//!                             │ (registry +   │
//! ┌────────────────┐   emit   │  broadcast)   │   subscribe  ┌──────────┐
//! │ Auth manager   ├─────────>│               ├─────────────>│  Stream  │
//! └────────────────┘          └───────────────┘              └──────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, EventKind, PlaybackState};
//!
//! let bus = EventBus::new(16);
//! let handle = bus.add_listener(EventKind::PlaybackStateDidChange, |event| {
//!     println!("{} -> {}", event.event_name(), event.payload());
//! });
//!
//! bus.emit(CoreEvent::PlaybackStateDidChange {
//!     result: PlaybackState::Playing,
//! });
//!
//! handle.remove();
//! ```
//!
//! Delivery is fire-and-forget: emitting with nobody listening is not an
//! error, and a slow stream subscriber lags instead of applying backpressure.

use bridge_traits::AuthorizationStatus;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// Canonical playback state reported to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
    Completed,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Stopped => "stopped",
            PlaybackState::Completed => "completed",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a [`CoreEvent`], used to register listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    PlaybackStateDidChange,
    AuthorizationStatusDidChange,
}

impl EventKind {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::PlaybackStateDidChange => "playbackStateDidChange",
            EventKind::AuthorizationStatusDidChange => "authorizationStatusDidChange",
        }
    }

    /// Parse a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "playbackStateDidChange" => Some(EventKind::PlaybackStateDidChange),
            "authorizationStatusDidChange" => Some(EventKind::AuthorizationStatusDidChange),
            _ => None,
        }
    }
}

/// Event pushed from the core to the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum CoreEvent {
    PlaybackStateDidChange { result: PlaybackState },
    AuthorizationStatusDidChange { result: AuthorizationStatus },
}

impl CoreEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CoreEvent::PlaybackStateDidChange { .. } => EventKind::PlaybackStateDidChange,
            CoreEvent::AuthorizationStatusDidChange { .. } => {
                EventKind::AuthorizationStatusDidChange
            }
        }
    }

    /// Wire name of the event.
    pub fn event_name(&self) -> &'static str {
        self.kind().name()
    }

    /// `{"result": ...}` payload handed to the transport.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            CoreEvent::PlaybackStateDidChange { result } => {
                serde_json::json!({ "result": result })
            }
            CoreEvent::AuthorizationStatusDidChange { result } => {
                serde_json::json!({ "result": result })
            }
        }
    }
}

// ============================================================================
// Listener Registry
// ============================================================================

/// Identifier of a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Listener = Arc<dyn Fn(&CoreEvent) + Send + Sync>;

struct RegisteredListener {
    kind: EventKind,
    callback: Listener,
}

#[derive(Default)]
struct ListenerRegistry {
    listeners: RwLock<HashMap<ListenerId, RegisteredListener>>,
}

impl ListenerRegistry {
    fn matching(&self, kind: EventKind) -> Vec<Listener> {
        self.listeners
            .read()
            .values()
            .filter(|listener| listener.kind == kind)
            .map(|listener| Arc::clone(&listener.callback))
            .collect()
    }

    fn remove(&self, id: &ListenerId) -> bool {
        self.listeners.write().remove(id).is_some()
    }
}

/// Disposable registration returned by [`EventBus::add_listener`].
///
/// Dropping the handle keeps the listener registered; call
/// [`ListenerHandle::remove`] to unregister it.
pub struct ListenerHandle {
    id: ListenerId,
    kind: EventKind,
    registry: Weak<ListenerRegistry>,
}

impl ListenerHandle {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Unregister the listener. Returns `false` if it was already removed.
    pub fn remove(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(&self.id),
            None => false,
        }
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus.
///
/// Cloning is cheap and every clone shares the same channel and registry.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
    registry: Arc<ListenerRegistry>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per stream
    ///   subscriber. When a subscriber falls behind by more than this amount,
    ///   it will receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            registry: Arc::new(ListenerRegistry::default()),
        }
    }

    /// Publishes an event to registered listeners and stream subscribers.
    ///
    /// Returns the number of receivers reached. Zero is not an error.
    pub fn emit(&self, event: CoreEvent) -> usize {
        let listeners = self.registry.matching(event.kind());
        // Callbacks run outside the registry lock so they may add or remove
        // listeners themselves.
        for listener in &listeners {
            listener(&event);
        }

        let streams = self.sender.send(event).unwrap_or(0);
        listeners.len() + streams
    }

    /// Registers a callback for one event kind.
    pub fn add_listener<F>(&self, kind: EventKind, callback: F) -> ListenerHandle
    where
        F: Fn(&CoreEvent) + Send + Sync + 'static,
    {
        let id = ListenerId::new();
        self.registry.listeners.write().insert(
            id,
            RegisteredListener {
                kind,
                callback: Arc::new(callback),
            },
        );

        ListenerHandle {
            id,
            kind,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Unregisters a listener by id.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.registry.remove(&id)
    }

    /// Unregisters every listener.
    pub fn remove_all_listeners(&self) {
        self.registry.listeners.write().clear();
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.listeners.read().len()
    }

    /// Creates a new stream subscriber.
    ///
    /// Each call creates an independent receiver that will receive all future
    /// events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active stream subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listener_count", &self.listener_count())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventKind, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let playback_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| event.kind() == EventKind::PlaybackStateDidChange);
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
