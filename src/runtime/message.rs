// src/runtime/message.rs

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-unique identifier of a mailbox (and of the actor owning it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(usize);

static NEXT_ADDRESS: AtomicUsize = AtomicUsize::new(1); // Start addresses from 1.

impl Address {
  /// Allocates the next address.
  pub fn next() -> Self {
    Address(NEXT_ADDRESS.fetch_add(1, Ordering::Relaxed))
  }

  pub fn as_usize(&self) -> usize {
    self.0
  }
}

impl fmt::Display for Address {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Bound for regular message payloads.
///
/// `cleanup` is invoked when a message is discarded instead of received:
/// rejected by a dead or full mailbox, or drained by `shutdown` (e.g. to fail
/// a pending reply). The default does nothing.
pub trait Payload: Send + fmt::Debug + 'static {
  fn cleanup(&mut self) {}
}

macro_rules! plain_payload {
  ($($t:ty),* $(,)?) => {
    $(impl Payload for $t {})*
  };
}

plain_payload!(
  (),
  bool,
  char,
  u8,
  u16,
  u32,
  u64,
  u128,
  usize,
  i8,
  i16,
  i32,
  i64,
  i128,
  isize,
  f32,
  f64,
  String,
  &'static str,
  Vec<u8>,
);

/// High-priority control events. These always jump the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemEvent {
  /// Graceful termination request.
  Terminate,
  /// A linked actor exited.
  Exit {
    source: Address,
    reason: Option<String>,
  },
  /// Named control signal for behaviour-specific handling.
  Signal { name: String },
}

/// A message in a mailbox: either a regular payload or a system event.
#[derive(Debug, Clone, PartialEq)]
pub enum Message<T> {
  Regular(T),
  System(SystemEvent),
}

impl<T> Message<T> {
  pub fn is_system_event(&self) -> bool {
    matches!(self, Message::System(_))
  }

  /// Returns the regular payload, if any.
  pub fn into_regular(self) -> Option<T> {
    match self {
      Message::Regular(payload) => Some(payload),
      Message::System(_) => None,
    }
  }

  pub fn as_regular(&self) -> Option<&T> {
    match self {
      Message::Regular(payload) => Some(payload),
      Message::System(_) => None,
    }
  }
}

impl<T: Payload> Message<T> {
  /// Invokes the payload's cleanup capability. System events carry none.
  pub(crate) fn cleanup(&mut self) {
    if let Message::Regular(payload) = self {
      payload.cleanup();
    }
  }
}

impl<T> From<SystemEvent> for Message<T> {
  fn from(event: SystemEvent) -> Self {
    Message::System(event)
  }
}
