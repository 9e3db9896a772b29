//! Boots a fixed set of named services as actors.
//!
//! No restart policy: a service that exits stays down until the system is
//! rebuilt.

use crate::actor::{Actor, ActorHandle, Behavior};
use crate::error::Result;
use crate::runtime::{MailboxConfig, Payload};
use crate::system::ActorSystem;

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// Typed access to a service once its group has run.
pub struct ServiceSlot<T> {
  cell: Arc<OnceCell<Actor<T>>>,
}

impl<T> Clone for ServiceSlot<T> {
  fn clone(&self) -> Self {
    Self {
      cell: Arc::clone(&self.cell),
    }
  }
}

impl<T: Payload> ServiceSlot<T> {
  /// The running service, or `None` before the group has been run.
  pub fn get(&self) -> Option<&Actor<T>> {
    self.cell.get()
  }
}

impl<T> fmt::Debug for ServiceSlot<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ServiceSlot").field("filled", &self.cell.get().is_some()).finish()
  }
}

type Launch = Box<dyn FnOnce(&ActorSystem) -> Result<Arc<dyn ActorHandle>> + Send>;

struct ServiceEntry {
  name: String,
  launch: Launch,
}

/// Ordered set of services booted together by [`ServiceGroup::run`].
pub struct ServiceGroup {
  name: String,
  services: Vec<ServiceEntry>,
}

impl ServiceGroup {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      services: Vec::new(),
    }
  }

  /// Adds a named service. It is spawned and registered under `name` when
  /// the group runs.
  pub fn supervise_as<B: Behavior>(&mut self, name: impl Into<String>, behavior: B) -> ServiceSlot<B::Payload> {
    let slot = ServiceSlot {
      cell: Arc::new(OnceCell::new()),
    };
    let fill = slot.clone();
    let name = name.into();
    let service_name = name.clone();

    self.supervise_with(name, move |system: &ActorSystem| {
      let actor = system.spawn_actor_with(Some(&service_name), behavior, MailboxConfig::unbounded())?;
      let handle = actor.handle();
      let _ = fill.cell.set(actor);
      Ok(handle)
    });
    slot
  }

  /// Adds a named service launched by `launch`, which returns the handle
  /// to register.
  pub fn supervise_with<F>(&mut self, name: impl Into<String>, launch: F)
  where
    F: FnOnce(&ActorSystem) -> Result<Arc<dyn ActorHandle>> + Send + 'static,
  {
    self.services.push(ServiceEntry {
      name: name.into(),
      launch: Box::new(launch),
    });
  }

  pub fn len(&self) -> usize {
    self.services.len()
  }

  pub fn is_empty(&self) -> bool {
    self.services.is_empty()
  }

  /// Spawns every service in order and registers it by name.
  ///
  /// Stops at the first service that fails to launch. The services already
  /// launched are then unregistered, terminated and joined (bounded by the
  /// system's group shutdown grace) before the error is returned.
  pub fn run(self, system: &ActorSystem) -> Result<Vec<Arc<dyn ActorHandle>>> {
    let mut started: Vec<(String, Arc<dyn ActorHandle>)> = Vec::with_capacity(self.services.len());
    for entry in self.services {
      let handle = match (entry.launch)(system) {
        Ok(handle) => handle,
        Err(e) => {
          tracing::error!(group = %self.name, service = %entry.name, "Failed to start service: {}", e);
          rollback(&self.name, system, started);
          return Err(e);
        }
      };
      tracing::info!(group = %self.name, service = %entry.name, address = %handle.address(), "Service started");
      system.register(entry.name.clone(), handle.clone());
      started.push((entry.name, handle));
    }
    Ok(started.into_iter().map(|(_, handle)| handle).collect())
  }
}

/// Undoes a partial `run`, newest service first.
fn rollback(group: &str, system: &ActorSystem, started: Vec<(String, Arc<dyn ActorHandle>)>) {
  let grace = system.config().group_shutdown_grace;
  for (name, handle) in started.into_iter().rev() {
    system.delete(&name);
    if let Err(e) = handle.terminate() {
      if !e.is_gone() {
        tracing::warn!(%group, service = %name, "Terminate during rollback failed: {}", e);
      }
    }
    if let Err(e) = handle.join(Some(grace)) {
      tracing::warn!(%group, service = %name, "Service did not stop during rollback: {}", e);
    }
  }
}

impl fmt::Debug for ServiceGroup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ServiceGroup")
      .field("name", &self.name)
      .field("services", &self.services.iter().map(|s| s.name.as_str()).collect::<Vec<_>>())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::actor::{ActorContext, Flow};
  use crate::config::SystemConfig;
  use crate::error::ActorError;
  use std::time::Duration;

  struct Idle;

  impl Behavior for Idle {
    type Payload = u32;

    fn handle(&mut self, _payload: u32, _ctx: &ActorContext<u32>) -> Flow {
      Flow::Continue
    }
  }

  fn system() -> ActorSystem {
    ActorSystem::new(SystemConfig::default().with_shutdown_timeout(Duration::from_secs(2)))
  }

  #[test]
  fn run_registers_every_service() {
    let system = system();
    let mut group = ServiceGroup::new("test");
    let first = group.supervise_as("first", Idle);
    let second = group.supervise_as("second", Idle);
    assert_eq!(group.len(), 2);

    let handles = group.run(&system).unwrap();
    assert_eq!(handles.len(), 2);
    assert_eq!(system.registered_names(), vec!["first".to_string(), "second".to_string()]);
    assert!(first.get().unwrap().is_alive());
    assert!(second.get().unwrap().is_alive());
    system.shutdown();
  }

  #[test]
  fn failed_launch_rolls_back_started_services() {
    let system = system();
    let mut group = ServiceGroup::new("test");
    let first = group.supervise_as("first", Idle);
    group.supervise_with("broken", |_system: &ActorSystem| Err(ActorError::Internal("refused".into())));
    let never = group.supervise_as("never", Idle);

    let err = group.run(&system).unwrap_err();
    assert!(matches!(err, ActorError::Internal(_)));

    assert!(system.registered_names().is_empty());
    let first = first.get().expect("first service was launched");
    first.join(Some(Duration::from_secs(2))).unwrap();
    assert!(!first.is_alive());
    assert!(never.get().is_none());
    system.shutdown();
    assert!(!system.is_running());
  }
}
