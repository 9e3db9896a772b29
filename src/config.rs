//! Runtime configuration: per-system settings and the process-wide debug flag.

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Default wall-clock budget for `ActorSystem::shutdown`.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Default capacity of the notification broadcast channel.
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 256;

/// Environment variable that switches verbose dead-letter logging on at startup.
pub const DEBUG_ENV_VAR: &str = "RCELL_DEBUG";

static DEBUG: Lazy<AtomicBool> = Lazy::new(|| {
  let enabled = std::env::var(DEBUG_ENV_VAR)
    .map(|v| matches!(v.as_str(), "1" | "true" | "yes" | "on"))
    .unwrap_or(false);
  AtomicBool::new(enabled)
});

/// Returns true when verbose dead-letter logging is enabled.
pub fn debug_enabled() -> bool {
  DEBUG.load(Ordering::Relaxed)
}

/// Toggles verbose dead-letter logging for the whole process.
pub fn set_debug(enabled: bool) {
  DEBUG.store(enabled, Ordering::Relaxed);
}

/// Settings for one `ActorSystem`.
#[derive(Debug, Clone)]
pub struct SystemConfig {
  /// Budget for graceful termination + join before escalating to kill.
  pub shutdown_timeout: Duration,
  /// Whether the runtime may force-kill actors that missed the shutdown deadline.
  /// When false the kill phase is skipped and a fatal diagnostic is logged instead.
  pub forced_kill: bool,
  /// Capacity bound applied to mailboxes of actors spawned without explicit config.
  pub default_mailbox_max_size: Option<usize>,
  pub event_bus_capacity: usize,
  /// How long `ThreadGroup::shutdown` waits for lingering units after the actor phase.
  pub group_shutdown_grace: Duration,
  /// Prefix for OS thread names of spawned units.
  pub thread_name_prefix: String,
}

impl Default for SystemConfig {
  fn default() -> Self {
    Self {
      shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
      forced_kill: true,
      default_mailbox_max_size: None,
      event_bus_capacity: DEFAULT_EVENT_BUS_CAPACITY,
      group_shutdown_grace: Duration::from_secs(1),
      thread_name_prefix: "rcell".to_string(),
    }
  }
}

impl SystemConfig {
  pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
    self.shutdown_timeout = timeout;
    self
  }

  pub fn with_forced_kill(mut self, enabled: bool) -> Self {
    self.forced_kill = enabled;
    self
  }

  /// Bounds mailboxes of actors spawned without explicit mailbox config. Minimum is 1.
  pub fn with_default_mailbox_max_size(mut self, max_size: Option<usize>) -> Self {
    self.default_mailbox_max_size = max_size.map(|s| s.max(1));
    self
  }

  pub fn with_event_bus_capacity(mut self, capacity: usize) -> Self {
    self.event_bus_capacity = capacity.max(1);
    self
  }

  pub fn with_group_shutdown_grace(mut self, grace: Duration) -> Self {
    self.group_shutdown_grace = grace;
    self
  }

  pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.thread_name_prefix = prefix.into();
    self
  }
}
