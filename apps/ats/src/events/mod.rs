pub mod bus;

pub use bus::{EventName, ListenerId, Notification, NotificationBus, Subscription};
