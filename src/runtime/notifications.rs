use super::message::Address;

use std::time::SystemTime;

/// Type identifier for execution units tracked by the thread group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
  /// A unit running an actor's receive loop (base services included).
  /// Only these are drained by `ActorSystem::shutdown`.
  Actor,
  /// A plain unit started with `ActorSystem::spawn`.
  Task,
}

impl Role {
  pub const fn as_str(self) -> &'static str {
    match self {
      Role::Actor => "actor",
      Role::Task => "task",
    }
  }
}

/// A crash or other failure worth reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incident {
  pub address: Option<Address>,
  pub name: Option<String>,
  pub description: String,
  pub at: SystemTime,
}

impl Incident {
  pub fn new(address: Option<Address>, name: Option<String>, description: impl Into<String>) -> Self {
    Self {
      address,
      name,
      description: description.into(),
      at: SystemTime::now(),
    }
  }
}

/// Events broadcast system-wide via the EventBus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
  /// Published after an actor's unit is launched.
  ActorStarted {
    address: Address,
    name: Option<String>,
    role: Role,
  },

  /// Published by an actor's unit just before it exits.
  ActorStopped {
    address: Address,
    name: Option<String>,
    /// True if the run loop ended by panic rather than a clean stop.
    crashed: bool,
  },

  /// Application-level notification fanned out by `NotificationFanout`.
  Published { topic: String, payload: String },

  /// Re-broadcast of an incident received by `IncidentReporter`.
  Incident(Incident),

  /// The system is about to drain all actors.
  SystemShuttingDown,
}
