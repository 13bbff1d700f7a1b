//! Events produced by the engine and the synchronous bus that fans them out.
//!
//! Subscribers are called in attach order on the publishing thread. Delivery
//! (sound, vibration, push, rendering) belongs to the subscribers.

use serde::{Deserialize, Serialize};

use crate::geofence::ZoneEvent;
use crate::progress::Announcement;
use crate::reroute::RerouteSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Enter,
    Exit,
    Instruction,
    RerouteNeeded,
    Status,
}

/// Engine state changes the presentation layer should reflect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEvent {
    LocationUnavailable,
    LocationRestored,
    GeofencingEnabled,
    GeofencingDisabled,
    NoRoutesFound,
    NavigationStarted,
    NavigationStopped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavEvent {
    Enter(ZoneEvent),
    Exit(ZoneEvent),
    Instruction(Announcement),
    RerouteNeeded(RerouteSignal),
    Status(StatusEvent),
}

impl NavEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            NavEvent::Enter(_) => EventKind::Enter,
            NavEvent::Exit(_) => EventKind::Exit,
            NavEvent::Instruction(_) => EventKind::Instruction,
            NavEvent::RerouteNeeded(_) => EventKind::RerouteNeeded,
            NavEvent::Status(_) => EventKind::Status,
        }
    }
}

/// Delivery collaborator for engine events.
pub trait NotificationSink {
    fn notify(&mut self, event: &NavEvent);
}

/// Handle returned by [`EventBus::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&NavEvent) + Send>;

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Handler)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&NavEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Attach a [`NotificationSink`].
    pub fn attach_sink<S>(&mut self, mut sink: S) -> SubscriptionId
    where
        S: NotificationSink + Send + 'static,
    {
        self.attach(move |event| sink.notify(event))
    }

    /// Returns false if the id was not attached.
    pub fn detach(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn publish(&mut self, event: &NavEvent) {
        for (_, handler) in self.subscribers.iter_mut() {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
