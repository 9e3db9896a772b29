// tests/common.rs
#![allow(dead_code)] // Not every test binary uses every helper

use rcell::{ActorError, ActorHandle, ActorSystem, Address, Role, SystemConfig};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

static TRACING_INIT: Once = Once::new();

// Setup function to initialize tracing
pub fn setup_tracing() {
  TRACING_INIT.call_once(|| {
    // Can be overridden by RUST_LOG env variable
    let default_filter = "rcell=debug,warn";
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
      .with_env_filter(env_filter)
      .with_target(true)
      .with_line_number(true)
      .with_test_writer()
      .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global tracing subscriber");
  });
}

// Helper to create a system with a short shutdown budget
pub fn test_system(shutdown_timeout: Duration) -> ActorSystem {
  setup_tracing();
  ActorSystem::new(
    SystemConfig::default()
      .with_shutdown_timeout(shutdown_timeout)
      .with_group_shutdown_grace(Duration::from_secs(2)),
  )
}

/// Polls `condition` until it holds or `within` elapses.
pub fn eventually<F: FnMut() -> bool>(within: Duration, mut condition: F) -> bool {
  let deadline = Instant::now() + within;
  loop {
    if condition() {
      return true;
    }
    if Instant::now() >= deadline {
      return false;
    }
    std::thread::sleep(Duration::from_millis(5));
  }
}

/// How a [`MockActor`] reacts to `terminate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnTerminate {
  /// Accepts and exits.
  Stop,
  /// Reports that it is already dead, and exits.
  AlreadyDead,
  /// Accepts but keeps running until killed.
  Ignore,
}

#[derive(Debug, Default)]
struct MockState {
  released: bool,
  exited: bool,
}

/// Hand-driven actor handle whose unit blocks until it is terminated or killed.
#[derive(Debug)]
pub struct MockActor {
  address: Address,
  on_terminate: OnTerminate,
  pub terminate_calls: AtomicUsize,
  pub join_calls: AtomicUsize,
  pub kill_calls: AtomicUsize,
  state: Mutex<MockState>,
  changed: Condvar,
}

impl MockActor {
  pub fn new(on_terminate: OnTerminate) -> Self {
    Self {
      address: Address::next(),
      on_terminate,
      terminate_calls: AtomicUsize::new(0),
      join_calls: AtomicUsize::new(0),
      kill_calls: AtomicUsize::new(0),
      state: Mutex::new(MockState::default()),
      changed: Condvar::new(),
    }
  }

  /// Spawns the mock's unit on `system` as an actor unit.
  pub fn spawn(system: &ActorSystem, name: &str, on_terminate: OnTerminate) -> Arc<MockActor> {
    let mock = Arc::new(MockActor::new(on_terminate));
    let handle: Arc<dyn ActorHandle> = mock.clone();
    let body = mock.clone();
    system
      .spawn_unit(Role::Actor, Some(name.to_string()), Some(Arc::downgrade(&handle)), move || body.run())
      .expect("spawn mock unit");
    mock
  }

  pub fn release(&self) {
    self.state.lock().released = true;
    self.changed.notify_all();
  }

  pub fn terminates(&self) -> usize {
    self.terminate_calls.load(Ordering::SeqCst)
  }

  pub fn joins(&self) -> usize {
    self.join_calls.load(Ordering::SeqCst)
  }

  pub fn kills(&self) -> usize {
    self.kill_calls.load(Ordering::SeqCst)
  }

  fn run(&self) {
    let mut state = self.state.lock();
    while !state.released {
      self.changed.wait(&mut state);
    }
    state.exited = true;
    self.changed.notify_all();
  }
}

impl ActorHandle for MockActor {
  fn address(&self) -> Address {
    self.address
  }

  fn terminate(&self) -> rcell::Result<()> {
    self.terminate_calls.fetch_add(1, Ordering::SeqCst);
    match self.on_terminate {
      OnTerminate::Stop => {
        self.release();
        Ok(())
      }
      OnTerminate::AlreadyDead => {
        self.release();
        Err(ActorError::DeadActor)
      }
      OnTerminate::Ignore => Ok(()),
    }
  }

  fn join(&self, timeout: Option<Duration>) -> rcell::Result<()> {
    self.join_calls.fetch_add(1, Ordering::SeqCst);
    let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
    let mut state = self.state.lock();
    while !state.exited {
      match deadline {
        Some(deadline) => {
          if self.changed.wait_until(&mut state, deadline).timed_out() && !state.exited {
            return Err(ActorError::Timeout);
          }
        }
        None => self.changed.wait(&mut state),
      }
    }
    Ok(())
  }

  fn kill(&self) -> rcell::Result<()> {
    self.kill_calls.fetch_add(1, Ordering::SeqCst);
    self.release();
    Ok(())
  }
}
