// src/runtime/thread_group.rs

//! Execution units: one OS thread per unit, tracked by role.

use super::notifications::Role;
use super::WaitGroup;
use crate::actor::ActorHandle;
use crate::error::Result;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

/// Identifier of one execution unit within its group.
pub type UnitId = usize;

/// Point-in-time record of a live unit.
#[derive(Clone)]
pub struct UnitInfo {
  pub id: UnitId,
  pub role: Role,
  pub name: Option<String>,
  actor: Option<Weak<dyn ActorHandle>>,
}

impl UnitInfo {
  /// Resolves the unit's actor handle. `None` if the unit carries no handle
  /// or the handle has already been dropped.
  pub fn actor(&self) -> Option<Arc<dyn ActorHandle>> {
    self.actor.as_ref().and_then(Weak::upgrade)
  }

  pub fn summary(&self) -> UnitSummary {
    UnitSummary {
      id: self.id,
      role: self.role,
      name: self.name.clone(),
      has_actor: self.actor().is_some(),
    }
  }
}

impl fmt::Debug for UnitInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("UnitInfo")
      .field("id", &self.id)
      .field("role", &self.role)
      .field("name", &self.name)
      .field("has_actor", &self.actor.is_some())
      .finish()
  }
}

/// Introspection view of a unit, detached from its handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSummary {
  pub id: UnitId,
  pub role: Role,
  pub name: Option<String>,
  pub has_actor: bool,
}

#[derive(Debug)]
struct GroupInner {
  units: Mutex<HashMap<UnitId, UnitInfo>>,
  next_id: AtomicUsize,
  wait_group: WaitGroup,
  thread_name_prefix: String,
}

/// Spawns and tracks execution units. Cloning yields another handle to the same group.
#[derive(Debug, Clone)]
pub struct ThreadGroup {
  inner: Arc<GroupInner>,
}

impl ThreadGroup {
  pub fn new(thread_name_prefix: impl Into<String>) -> Self {
    Self {
      inner: Arc::new(GroupInner {
        units: Mutex::new(HashMap::new()),
        next_id: AtomicUsize::new(1),
        wait_group: WaitGroup::new(),
        thread_name_prefix: thread_name_prefix.into(),
      }),
    }
  }

  /// Spawns `body` on a new named OS thread.
  ///
  /// The unit is recorded before the thread starts and removed when `body`
  /// returns or unwinds.
  pub fn spawn<F>(&self, role: Role, name: Option<String>, actor: Option<Weak<dyn ActorHandle>>, body: F) -> Result<UnitId>
  where
    F: FnOnce() + Send + 'static,
  {
    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
    let thread_name = format!("{}-{}-{}", self.inner.thread_name_prefix, role.as_str(), id);

    self.inner.units.lock().insert(
      id,
      UnitInfo {
        id,
        role,
        name: name.clone(),
        actor,
      },
    );
    self.inner.wait_group.add(1);

    // Dropped when the body finishes, unwinds, or the closure is discarded
    // because the thread could not be created.
    let guard = UnitGuard {
      group: self.clone(),
      id,
      role,
    };

    thread::Builder::new().name(thread_name).spawn(move || {
      let _guard = guard;
      body();
    })?;

    tracing::trace!(unit = id, role = role.as_str(), ?name, "Spawned unit");
    Ok(id)
  }

  /// Visits a point-in-time copy of the live units. The group lock is not
  /// held while `visit` runs.
  pub fn for_each<F>(&self, mut visit: F)
  where
    F: FnMut(&UnitInfo),
  {
    for unit in self.snapshot() {
      visit(&unit);
    }
  }

  pub fn snapshot(&self) -> Vec<UnitInfo> {
    let mut units: Vec<UnitInfo> = self.inner.units.lock().values().cloned().collect();
    units.sort_by_key(|u| u.id);
    units
  }

  /// True while at least one unit is live.
  pub fn active(&self) -> bool {
    !self.inner.units.lock().is_empty()
  }

  pub fn count(&self, role: Role) -> usize {
    self.inner.units.lock().values().filter(|u| u.role == role).count()
  }

  /// Waits up to `grace` for every unit to finish.
  ///
  /// Threads cannot be killed safely, so units still running after the grace
  /// period are logged and left to finish on their own. Returns true if the
  /// group drained.
  pub fn shutdown(&self, grace: Duration) -> bool {
    if self.inner.wait_group.wait_timeout(grace) {
      tracing::debug!("Thread group drained");
      return true;
    }
    let lingering = self.snapshot();
    tracing::warn!(
      outstanding = self.inner.wait_group.get_count(),
      count = lingering.len(),
      units = ?lingering.iter().map(|u| (u.id, u.role.as_str(), u.name.clone())).collect::<Vec<_>>(),
      ?grace,
      "Thread group shutdown left units running"
    );
    false
  }

  fn remove(&self, id: UnitId) {
    if self.inner.units.lock().remove(&id).is_some() {
      self.inner.wait_group.done();
    } else {
      tracing::warn!(unit = id, "Attempted to remove non-existent unit");
    }
  }
}

struct UnitGuard {
  group: ThreadGroup,
  id: UnitId,
  role: Role,
}

impl Drop for UnitGuard {
  fn drop(&mut self) {
    if thread::panicking() {
      tracing::debug!(unit = self.id, role = self.role.as_str(), "Unit stopping abnormally (panicked)");
    }
    self.group.remove(self.id);
  }
}
