use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One-way gate that opens when its count reaches zero.
/// Used as the exit signal that `join` waits on.
#[derive(Debug, Clone)]
pub(crate) struct CountDownLatch {
  inner: Arc<LatchInner>,
}

#[derive(Debug)]
struct LatchInner {
  count: Mutex<usize>,
  open: Condvar,
}

impl CountDownLatch {
  /// Creates a new latch initialized with the given count.
  pub fn new(count: usize) -> Self {
    Self {
      inner: Arc::new(LatchInner {
        count: Mutex::new(count),
        open: Condvar::new(),
      }),
    }
  }

  /// Decrements the count, releasing all waiting threads when it reaches zero.
  /// Counting down an open latch is a no-op.
  pub fn count_down(&self) {
    let mut count = self.inner.count.lock();
    if *count == 0 {
      return;
    }
    *count -= 1;
    if *count == 0 {
      self.inner.open.notify_all();
    }
  }

  pub fn is_open(&self) -> bool {
    *self.inner.count.lock() == 0
  }

  /// Waits until the latch opens or `timeout` elapses (`None` waits forever).
  /// Returns true if the latch is open.
  pub fn wait(&self, timeout: Option<Duration>) -> bool {
    // A timeout past the representable range waits forever.
    let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
    let mut count = self.inner.count.lock();
    while *count != 0 {
      match deadline {
        Some(deadline) => {
          if self.inner.open.wait_until(&mut count, deadline).timed_out() {
            return *count == 0;
          }
        }
        None => self.inner.open.wait(&mut count),
      }
    }
    true
  }
}
