//! The actor system: owns the thread group, registry and base services, and
//! drives coordinated shutdown of every live actor.

use crate::actor::{self, Actor, ActorHandle, Behavior};
use crate::config::SystemConfig;
use crate::error::{ActorError, Result};
use crate::registry::Registry;
use crate::runtime::{
  DeadLetterOffice, EventBus, Incident, Mailbox, MailboxConfig, Notification, Role, ThreadGroup, UnitId,
  UnitSummary,
};
use crate::services::{
  FanoutRequest, GroupManager, GroupRequest, GroupSnapshot, IncidentLog, IncidentReporter, NotificationFanout,
  ServiceGroup, ServiceSlot, GROUP_MANAGER, INCIDENT_REPORTER, NOTIFICATIONS_FANOUT,
};

use once_cell::sync::OnceCell;
use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

thread_local! {
  /// The system bound for the current execution unit, if any.
  static CURRENT_SYSTEM: RefCell<Option<ActorSystem>> = const { RefCell::new(None) };
}

/// Restores the previous current-system binding on drop.
struct ScopeGuard {
  previous: Option<ActorSystem>,
}

impl Drop for ScopeGuard {
  fn drop(&mut self) {
    let previous = self.previous.take();
    CURRENT_SYSTEM.with(|current| *current.borrow_mut() = previous);
  }
}

/// Typed handles of the base services booted by `start`.
#[derive(Debug)]
struct BaseServices {
  fanout: ServiceSlot<FanoutRequest>,
  incidents: ServiceSlot<Incident>,
  group_manager: ServiceSlot<GroupRequest>,
}

/// Outcome of [`ActorSystem::shutdown`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
  /// Actor handles in the snapshot taken at the start of shutdown.
  pub actors: usize,
  /// True if terminate + join did not finish within the shutdown timeout.
  pub timed_out: bool,
  /// Kill attempts made during escalation.
  pub killed: usize,
}

struct SystemInner {
  config: SystemConfig,
  registry: Registry,
  group: ThreadGroup,
  event_bus: EventBus,
  dead_letters: DeadLetterOffice,
  incident_log: IncidentLog,
  services: OnceCell<BaseServices>,
}

/// Handle to an actor system. Cloning yields another handle to the same system.
#[derive(Clone)]
pub struct ActorSystem {
  inner: Arc<SystemInner>,
}

impl Default for ActorSystem {
  fn default() -> Self {
    Self::new(SystemConfig::default())
  }
}

impl ActorSystem {
  pub fn new(config: SystemConfig) -> Self {
    tracing::debug!(?config, "Creating new actor system");
    Self {
      inner: Arc::new(SystemInner {
        group: ThreadGroup::new(config.thread_name_prefix.clone()),
        event_bus: EventBus::with_capacity(config.event_bus_capacity),
        registry: Registry::new(),
        dead_letters: DeadLetterOffice::new(),
        incident_log: IncidentLog::new(),
        services: OnceCell::new(),
        config,
      }),
    }
  }

  /// Boots the base services (notification fanout, incident reporter,
  /// group manager) under one service group, with this system as the
  /// current system. Fails with `AlreadyStarted` once a start has succeeded.
  ///
  /// If a service fails to launch, the ones already launched are stopped and
  /// unregistered, and `start` may be retried.
  pub fn start(&self) -> Result<()> {
    let mut booted = false;
    self.inner.services.get_or_try_init(|| {
      booted = true;
      self.boot_services()
    })?;
    if !booted {
      return Err(ActorError::AlreadyStarted);
    }
    tracing::info!(services = ?self.registered_names(), "Actor system started");
    Ok(())
  }

  fn boot_services(&self) -> Result<BaseServices> {
    let mut group = ServiceGroup::new("root");
    let services = BaseServices {
      fanout: group.supervise_as(NOTIFICATIONS_FANOUT, NotificationFanout::new(self.inner.event_bus.clone())),
      incidents: group.supervise_as(
        INCIDENT_REPORTER,
        IncidentReporter::new(self.inner.event_bus.clone(), self.inner.incident_log.clone()),
      ),
      group_manager: group.supervise_as(GROUP_MANAGER, GroupManager),
    };
    self.within_scope(|| group.run(self))?;
    Ok(services)
  }

  pub fn config(&self) -> &SystemConfig {
    &self.inner.config
  }

  pub fn event_bus(&self) -> &EventBus {
    &self.inner.event_bus
  }

  pub fn dead_letters(&self) -> &DeadLetterOffice {
    &self.inner.dead_letters
  }

  // --- Current-system binding ---

  /// The system bound to the calling execution unit, if any.
  pub fn current() -> Option<ActorSystem> {
    CURRENT_SYSTEM.with(|current| current.borrow().clone())
  }

  /// Runs `f` with this system as the current system, restoring the previous
  /// binding afterwards, including when `f` panics.
  pub fn within_scope<F, R>(&self, f: F) -> R
  where
    F: FnOnce() -> R,
  {
    let previous = CURRENT_SYSTEM.with(|current| current.replace(Some(self.clone())));
    let _guard = ScopeGuard { previous };
    f()
  }

  // --- Spawning ---

  /// Spawns a plain execution unit that runs `f` within this system's scope.
  pub fn spawn<F>(&self, f: F) -> Result<UnitId>
  where
    F: FnOnce() + Send + 'static,
  {
    self.spawn_unit(Role::Task, None, None, f)
  }

  /// Spawns an execution unit with an explicit role and optional actor
  /// handle. Units with `Role::Actor` and a live handle are drained by
  /// `shutdown`.
  pub fn spawn_unit<F>(&self, role: Role, name: Option<String>, actor: Option<Weak<dyn ActorHandle>>, f: F) -> Result<UnitId>
  where
    F: FnOnce() + Send + 'static,
  {
    let system = self.clone();
    self.inner.group.spawn(role, name, actor, move || system.within_scope(f))
  }

  /// Spawns an actor with the system's default mailbox settings.
  pub fn spawn_actor<B: Behavior>(&self, name: Option<&str>, behavior: B) -> Result<Actor<B::Payload>> {
    let config = MailboxConfig {
      max_size: self.inner.config.default_mailbox_max_size,
    };
    self.spawn_actor_with(name, behavior, config)
  }

  pub fn spawn_actor_with<B: Behavior>(
    &self,
    name: Option<&str>,
    behavior: B,
    mailbox_config: MailboxConfig,
  ) -> Result<Actor<B::Payload>> {
    actor::spawn(self, name.map(str::to_string), behavior, mailbox_config)
  }

  // --- Registry ---

  pub fn register(&self, name: impl Into<String>, handle: Arc<dyn ActorHandle>) -> Option<Arc<dyn ActorHandle>> {
    self.inner.registry.set(name, handle)
  }

  pub fn get(&self, name: &str) -> Option<Arc<dyn ActorHandle>> {
    self.inner.registry.get(name)
  }

  pub fn delete(&self, name: &str) -> Option<Arc<dyn ActorHandle>> {
    self.inner.registry.delete(name)
  }

  pub fn registered_names(&self) -> Vec<String> {
    self.inner.registry.names()
  }

  pub fn clear_registry(&self) {
    self.inner.registry.clear();
  }

  // --- Introspection ---

  /// Handles of every actor unit, resolved from a point-in-time snapshot of
  /// the thread group. Units without a handle, or whose handle is gone, are
  /// skipped.
  pub fn running(&self) -> Vec<Arc<dyn ActorHandle>> {
    let mut actors = Vec::new();
    self.inner.group.for_each(|unit| {
      if unit.role != Role::Actor {
        return;
      }
      if let Some(handle) = unit.actor() {
        actors.push(handle);
      }
    });
    actors
  }

  /// True while the thread group has at least one live unit.
  pub fn is_running(&self) -> bool {
    self.inner.group.active()
  }

  /// Fails with `StillActive` if any actor unit remains.
  pub fn assert_inactive(&self) -> Result<()> {
    let remaining = self.inner.group.count(Role::Actor);
    if remaining > 0 {
      tracing::error!(remaining, "Actor units still active");
      return Err(ActorError::StillActive(remaining));
    }
    Ok(())
  }

  /// One line per live unit.
  pub fn stack_summary(&self) -> Vec<UnitSummary> {
    self.inner.group.snapshot().iter().map(|u| u.summary()).collect()
  }

  /// Asks the group manager service for a unit summary.
  pub fn query_group(&self, timeout: Duration) -> Result<GroupSnapshot> {
    let manager = self.base_services()?.group_manager.get().ok_or(ActorError::DeadActor)?;
    let reply = Mailbox::<GroupSnapshot>::with_config(MailboxConfig::bounded(1), self.inner.dead_letters.clone());
    manager.tell(GroupRequest::Snapshot { reply: reply.clone() });

    match reply.receive(Some(timeout), None) {
      Ok(message) => message
        .into_regular()
        .ok_or_else(|| ActorError::Internal("unexpected system event in reply mailbox".into())),
      Err(ActorError::MailboxDead) => Err(ActorError::DeadActor),
      Err(e) => Err(e),
    }
  }

  // --- Notifications & incidents ---

  pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
    self.inner.event_bus.subscribe()
  }

  /// Publishes through the fanout service, or straight onto the bus before `start`.
  pub fn publish(&self, topic: impl Into<String>, payload: impl Into<String>) {
    let notification = Notification::Published {
      topic: topic.into(),
      payload: payload.into(),
    };
    match self.inner.services.get().and_then(|s| s.fanout.get()) {
      Some(fanout) => fanout.tell(FanoutRequest::Publish(notification)),
      None => self.inner.event_bus.publish_quiet(notification),
    }
  }

  /// Sends an incident to the incident reporter, or logs it before `start`.
  pub fn report_incident(&self, incident: Incident) {
    match self.inner.services.get().and_then(|s| s.incidents.get()) {
      Some(reporter) => reporter.tell(incident),
      None => {
        tracing::error!(address = ?incident.address, name = ?incident.name, "Incident: {}", incident.description);
        self.inner.incident_log.push(incident);
      }
    }
  }

  /// Most recent incidents, oldest first.
  pub fn recent_incidents(&self) -> Vec<Incident> {
    self.inner.incident_log.snapshot()
  }

  fn base_services(&self) -> Result<&BaseServices> {
    self
      .inner
      .services
      .get()
      .ok_or_else(|| ActorError::Internal("actor system not started".into()))
  }

  // --- Shutdown ---

  /// Terminates every running actor, escalating to kill when the shutdown
  /// timeout is exceeded, then tears the thread group down and clears the
  /// registry.
  ///
  /// Per-actor failures ("already dead") never abort the batch. Cleanup runs
  /// regardless of the outcome.
  pub fn shutdown(&self) -> ShutdownReport {
    let _cleanup = ShutdownCleanup { system: self };
    let timeout = self.inner.config.shutdown_timeout;

    self.inner.event_bus.publish_quiet(Notification::SystemShuttingDown);

    let actors = self.running();
    tracing::info!(actors = actors.len(), ?timeout, "Shutting down actor system");

    let mut report = ShutdownReport {
      actors: actors.len(),
      ..ShutdownReport::default()
    };

    // A timeout past the representable range means no deadline.
    if terminate_and_join(&actors, Instant::now().checked_add(timeout)).is_err() {
      report.timed_out = true;

      if self.inner.config.forced_kill {
        tracing::warn!(?timeout, "Couldn't cleanly terminate all actors. Killing them.");
        for actor in &actors {
          report.killed += 1;
          match actor.kill() {
            Ok(()) => {}
            Err(e) if e.is_gone() => {}
            Err(e) => tracing::warn!(address = %actor.address(), "Kill failed: {}", e),
          }
        }
      } else {
        tracing::error!(
          ?timeout,
          remaining = actors.len(),
          "Couldn't cleanly terminate all actors and forced kill is disabled. Leaving them running."
        );
      }
    }

    report
  }
}

/// Graceful phase: terminate every handle, then join each one against the
/// shared deadline (`None` joins without one). Fails with `Timeout` once the
/// deadline passes.
fn terminate_and_join(actors: &[Arc<dyn ActorHandle>], deadline: Option<Instant>) -> Result<()> {
  let expired = || deadline.is_some_and(|d| Instant::now() >= d);

  for actor in actors {
    if expired() {
      return Err(ActorError::Timeout);
    }
    match actor.terminate() {
      Ok(()) => {}
      Err(ActorError::DeadActor) => {}
      Err(e) => tracing::warn!(address = %actor.address(), "Terminate failed: {}", e),
    }
  }

  for actor in actors {
    let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
    if remaining.is_some_and(|r| r.is_zero()) {
      return Err(ActorError::Timeout);
    }
    match actor.join(remaining) {
      Ok(()) => {}
      Err(ActorError::DeadActor) => {}
      Err(ActorError::Timeout) => return Err(ActorError::Timeout),
      Err(e) => tracing::warn!(address = %actor.address(), "Join failed: {}", e),
    }
  }
  Ok(())
}

/// Unconditional tail of `shutdown`, run on every exit path.
struct ShutdownCleanup<'a> {
  system: &'a ActorSystem,
}

impl Drop for ShutdownCleanup<'_> {
  fn drop(&mut self) {
    let inner = &self.system.inner;
    inner.group.shutdown(inner.config.group_shutdown_grace);
    inner.registry.clear();
    tracing::info!("Actor system shut down");
  }
}

impl fmt::Debug for ActorSystem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ActorSystem")
      .field("started", &self.inner.services.get().is_some())
      .field("registered", &self.inner.registry.len())
      .field("units", &self.inner.group.snapshot().len())
      .finish_non_exhaustive()
  }
}
