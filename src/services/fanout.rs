use crate::actor::{ActorContext, Behavior, Flow};
use crate::runtime::{EventBus, Notification, Payload};

/// Requests accepted by [`NotificationFanout`].
#[derive(Debug, Clone)]
pub enum FanoutRequest {
  Publish(Notification),
}

impl Payload for FanoutRequest {}

/// Base service that broadcasts notifications on the system's event bus.
#[derive(Debug)]
pub struct NotificationFanout {
  bus: EventBus,
  delivered: u64,
}

impl NotificationFanout {
  pub fn new(bus: EventBus) -> Self {
    Self { bus, delivered: 0 }
  }
}

impl Behavior for NotificationFanout {
  type Payload = FanoutRequest;

  fn handle(&mut self, request: FanoutRequest, ctx: &ActorContext<FanoutRequest>) -> Flow {
    match request {
      FanoutRequest::Publish(notification) => match self.bus.publish(notification) {
        Ok(receivers) => {
          self.delivered += 1;
          tracing::trace!(address = %ctx.address(), receivers, "Fanned out notification");
        }
        Err(_) => tracing::trace!(address = %ctx.address(), "Notification published with no subscribers"),
      },
    }
    Flow::Continue
  }

  fn on_stop(&mut self, ctx: &ActorContext<FanoutRequest>) {
    tracing::debug!(address = %ctx.address(), delivered = self.delivered, "Notification fanout stopped");
  }
}
