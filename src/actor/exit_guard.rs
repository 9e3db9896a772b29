use super::ActorCore;
use crate::runtime::{Incident, Notification, Payload};
use crate::system::ActorSystem;

use std::sync::Arc;
use tracing::debug;

/// Runs an actor's exit protocol when its run loop ends, however it ends.
pub(crate) struct ExitGuard<T: Payload> {
  system: ActorSystem,
  core: Arc<ActorCore<T>>,
  stopped_normally: bool,
}

impl<T: Payload> ExitGuard<T> {
  pub fn new(system: ActorSystem, core: Arc<ActorCore<T>>) -> Self {
    Self {
      system,
      core,
      stopped_normally: false,
    }
  }

  /// Marks the run loop as having ended cleanly.
  pub fn waive(&mut self) {
    self.stopped_normally = true;
  }
}

impl<T: Payload> Drop for ExitGuard<T> {
  fn drop(&mut self) {
    let address = self.core.mailbox.address();
    let name = self.core.name.clone();
    let crashed = !self.stopped_normally;

    if crashed {
      debug!(
        "ExitGuard: Actor {} ({:?}) stopping abnormally (panicked). Reporting incident.",
        address, name
      );
      self
        .system
        .report_incident(Incident::new(Some(address), name.clone(), "actor crashed"));
    }

    // The actor shuts its own mailbox down. A prior kill already did.
    if self.core.mailbox.shutdown().is_err() {
      debug!(%address, "Mailbox already dead at actor exit");
    }

    self.core.exited.count_down();

    self
      .system
      .event_bus()
      .publish_quiet(Notification::ActorStopped { address, name, crashed });
  }
}
