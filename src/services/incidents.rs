use crate::actor::{ActorContext, Behavior, Flow};
use crate::runtime::{EventBus, Incident, Notification, Payload};

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// How many incidents the reporter keeps for `ActorSystem::recent_incidents`.
pub const INCIDENT_HISTORY: usize = 64;

impl Payload for Incident {}

/// Bounded, shared history of reported incidents (oldest first).
#[derive(Debug, Clone, Default)]
pub struct IncidentLog {
  inner: Arc<Mutex<VecDeque<Incident>>>,
}

impl IncidentLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&self, incident: Incident) {
    let mut log = self.inner.lock();
    if log.len() == INCIDENT_HISTORY {
      log.pop_front();
    }
    log.push_back(incident);
  }

  pub fn snapshot(&self) -> Vec<Incident> {
    self.inner.lock().iter().cloned().collect()
  }
}

/// Base service that logs incidents, records them and re-broadcasts them.
#[derive(Debug)]
pub struct IncidentReporter {
  bus: EventBus,
  log: IncidentLog,
}

impl IncidentReporter {
  pub fn new(bus: EventBus, log: IncidentLog) -> Self {
    Self { bus, log }
  }
}

impl Behavior for IncidentReporter {
  type Payload = Incident;

  fn handle(&mut self, incident: Incident, _ctx: &ActorContext<Incident>) -> Flow {
    tracing::error!(
      address = ?incident.address,
      name = ?incident.name,
      "Incident: {}",
      incident.description
    );
    self.log.push(incident.clone());
    self.bus.publish_quiet(Notification::Incident(incident));
    Flow::Continue
  }
}
