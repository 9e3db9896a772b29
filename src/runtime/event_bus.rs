// src/runtime/event_bus.rs

use super::notifications::Notification;
use crate::config::DEFAULT_EVENT_BUS_CAPACITY;

use tokio::sync::broadcast::{self, error::SendError, Receiver, Sender};

/// A self-contained event bus for broadcasting system-wide notifications.
/// Internally uses tokio::sync::broadcast; subscribers on plain threads use
/// `Receiver::blocking_recv` or `try_recv`.
#[derive(Debug, Clone)]
pub struct EventBus {
  sender: Sender<Notification>,
}

impl EventBus {
  /// Creates a new EventBus with default capacity.
  pub fn new() -> Self {
    Self::with_capacity(DEFAULT_EVENT_BUS_CAPACITY)
  }

  /// Creates a new EventBus with specific capacity.
  pub fn with_capacity(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity.max(1)); // Ensure capacity >= 1
    tracing::debug!(capacity = capacity.max(1), "Created new EventBus");
    Self { sender }
  }

  /// Publishes a notification onto the bus.
  ///
  /// Returns the number of active receivers the notification was sent to,
  /// or an error if there are no receivers.
  pub fn publish(&self, notification: Notification) -> Result<usize, SendError<Notification>> {
    tracing::trace!(?notification, "Publishing notification");
    self.sender.send(notification)
  }

  /// Publishes and ignores the "no subscribers" case.
  pub(crate) fn publish_quiet(&self, notification: Notification) {
    let _ = self.sender.send(notification);
  }

  /// Creates a new receiver that sees every notification published *after*
  /// it subscribed. A lagging receiver may miss notifications.
  pub fn subscribe(&self) -> Receiver<Notification> {
    tracing::trace!("Creating new event bus subscription");
    self.sender.subscribe()
  }

  /// Returns the number of active subscribers.
  pub fn subscriber_count(&self) -> usize {
    self.sender.receiver_count()
  }
}

impl Default for EventBus {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn publish_without_subscribers_is_an_error() {
    let bus = EventBus::with_capacity(4);
    assert!(bus.publish(Notification::SystemShuttingDown).is_err());
    assert_eq!(bus.subscriber_count(), 0);
  }

  #[test]
  fn subscribers_receive_published_notifications() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    assert_eq!(bus.publish(Notification::SystemShuttingDown).unwrap(), 1);
    assert_eq!(rx.blocking_recv().unwrap(), Notification::SystemShuttingDown);
  }
}
