// src/runtime/waitgroup.rs

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A blocking WaitGroup, similar to Go's `sync.WaitGroup`.
///
/// Execution units register themselves with the group (`add`) and signal
/// completion (`done`). Another thread can wait (`wait` / `wait_timeout`)
/// until all registered units have completed (counter returns to zero).
#[derive(Debug, Clone, Default)]
pub(crate) struct WaitGroup {
  inner: Arc<WaitGroupInner>,
}

#[derive(Debug, Default)]
struct WaitGroupInner {
  count: Mutex<usize>,
  zero: Condvar,
}

impl WaitGroup {
  /// Creates a new WaitGroup with an initial count of zero.
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a delta to the WaitGroup counter.
  pub fn add(&self, delta: usize) {
    if delta == 0 {
      return;
    }
    let mut count = self.inner.count.lock();
    if *count == 0 {
      tracing::trace!(delta, "WaitGroup count increased from zero");
    }
    *count += delta;
  }

  /// Decrements the WaitGroup counter by one, waking all waiters at zero.
  ///
  /// Panics if the counter would drop below zero.
  pub fn done(&self) {
    let mut count = self.inner.count.lock();
    if *count == 0 {
      drop(count);
      panic!("WaitGroup::done() called when count was already zero!");
    }
    *count -= 1;
    if *count == 0 {
      self.inner.zero.notify_all();
      tracing::trace!("WaitGroup count reached zero, notifying waiters");
    }
  }

  /// Blocks until the counter becomes zero.
  pub fn wait(&self) {
    let mut count = self.inner.count.lock();
    while *count != 0 {
      self.inner.zero.wait(&mut count);
    }
  }

  /// Blocks until the counter becomes zero or `timeout` elapses.
  /// Returns true if the counter reached zero.
  pub fn wait_timeout(&self, timeout: Duration) -> bool {
    let Some(deadline) = Instant::now().checked_add(timeout) else {
      self.wait();
      return true;
    };
    let mut count = self.inner.count.lock();
    while *count != 0 {
      // Re-check after every wakeup; a timed-out wait still re-reads the count.
      if self.inner.zero.wait_until(&mut count, deadline).timed_out() {
        return *count == 0;
      }
    }
    true
  }

  /// Returns the current count.
  pub fn get_count(&self) -> usize {
    *self.inner.count.lock()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::thread;

  #[test]
  fn test_waitgroup_add_done_wait() {
    let wg = WaitGroup::new();
    assert_eq!(wg.get_count(), 0);

    wg.add(2);
    assert_eq!(wg.get_count(), 2);

    let wg1 = wg.clone();
    let t1 = thread::spawn(move || {
      thread::sleep(Duration::from_millis(10));
      wg1.done();
    });

    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let wg2 = wg.clone();
    let t2 = thread::spawn(move || {
      release_rx.recv().unwrap();
      wg2.done();
    });

    t1.join().unwrap();
    assert_eq!(wg.get_count(), 1);
    assert!(!wg.wait_timeout(Duration::from_millis(10)), "second unit still outstanding");

    release_tx.send(()).unwrap();
    assert!(wg.wait_timeout(Duration::from_secs(2)));
    t2.join().unwrap();
    assert_eq!(wg.get_count(), 0);
  }

  #[test]
  fn test_waitgroup_wait_on_zero() {
    let wg = WaitGroup::new();
    let start = Instant::now();
    wg.wait();
    assert!(wg.wait_timeout(Duration::from_secs(1)));
    assert!(start.elapsed() < Duration::from_millis(100));
  }

  #[test]
  fn test_waitgroup_wait_timeout_unrepresentable() {
    let wg = WaitGroup::new();
    wg.add(1);
    let wg1 = wg.clone();
    let t1 = thread::spawn(move || {
      thread::sleep(Duration::from_millis(10));
      wg1.done();
    });
    assert!(wg.wait_timeout(Duration::MAX));
    t1.join().unwrap();
  }

  #[test]
  #[should_panic]
  fn test_waitgroup_done_panic_on_zero() {
    let wg = WaitGroup::new();
    wg.done();
  }
}
