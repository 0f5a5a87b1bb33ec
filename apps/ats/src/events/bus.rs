//! In-process change notification bus.
//!
//! One bus instance is shared (as `Arc<NotificationBus>`) by every component
//! that mutates or displays ATS data. Components subscribe when they come up
//! and drop their [`Subscription`] when they go away.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Fixed vocabulary of change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventName {
    CandidatesUpdated,
    JobsUpdated,
    RolesUpdated,
    PermissionsUpdated,
    RolePermissionsUpdated,
    UsersUpdated,
}

impl EventName {
    pub const ALL: [EventName; 6] = [
        EventName::CandidatesUpdated,
        EventName::JobsUpdated,
        EventName::RolesUpdated,
        EventName::PermissionsUpdated,
        EventName::RolePermissionsUpdated,
        EventName::UsersUpdated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::CandidatesUpdated => "candidates-updated",
            EventName::JobsUpdated => "jobs-updated",
            EventName::RolesUpdated => "roles-updated",
            EventName::PermissionsUpdated => "permissions-updated",
            EventName::RolePermissionsUpdated => "role-permissions-updated",
            EventName::UsersUpdated => "users-updated",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventName::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("unknown event name '{s}'"))
    }
}

/// A single delivered notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub event: EventName,
    pub payload: Option<Value>,
    pub emitted_at: DateTime<Utc>,
}

/// Identifies one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Publish/subscribe relay. Holds listeners only; events are never stored.
#[derive(Default)]
pub struct NotificationBus {
    listeners: RwLock<HashMap<EventName, Vec<(ListenerId, Handler)>>>,
    next_listener_id: AtomicU64,
}

impl NotificationBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `handler` for `event`. The returned guard unsubscribes on drop.
    #[must_use = "dropping the subscription unsubscribes the handler immediately"]
    pub fn subscribe<F>(self: &Arc<Self>, event: EventName, handler: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event)
            .or_default()
            .push((id, Arc::new(handler)));

        Subscription {
            bus: Arc::downgrade(self),
            event,
            id,
            active: true,
        }
    }

    /// Delivers synchronously to every listener registered for `event` right now,
    /// in registration order. Returns the number of listeners reached.
    pub fn emit(&self, event: EventName, payload: Option<Value>) -> usize {
        // Snapshot so handlers may subscribe/unsubscribe without deadlocking.
        let handlers: Vec<Handler> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event)
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        if handlers.is_empty() {
            debug!("No listeners for {event}; dropping notification");
            return 0;
        }

        let notification = Notification {
            event,
            payload,
            emitted_at: Utc::now(),
        };
        for handler in &handlers {
            handler(&notification);
        }
        handlers.len()
    }

    pub fn listener_count(&self, event: EventName) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event)
            .map_or(0, Vec::len)
    }

    fn remove(&self, event: EventName, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(list) = listeners.get_mut(&event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        let removed = list.len() < before;
        if list.is_empty() {
            listeners.remove(&event);
        }
        removed
    }
}

/// Disposer returned by [`NotificationBus::subscribe`].
pub struct Subscription {
    bus: Weak<NotificationBus>,
    event: EventName,
    id: ListenerId,
    active: bool,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn event(&self) -> EventName {
        self.event
    }

    /// Unsubscribes now. Returns false if the bus is already gone.
    pub fn unsubscribe(mut self) -> bool {
        self.detach()
    }

    fn detach(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.bus
            .upgrade()
            .is_some_and(|bus| bus.remove(self.event, self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}
