// src/runtime/mailbox.rs

//! Thread-safe, ordered actor mailbox with priority system events.
//!
//! One mutex guards the queue and the dead flag together; one condition
//! variable is signalled on every send and on shutdown so blocked receivers
//! always observe state changes.

use super::dead_letter::{DeadLetterOffice, DeadLetterReason};
use super::message::{Address, Message, Payload};
use crate::error::{ActorError, Result};

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Predicate used by filtered receives. System events always match.
pub type MessageFilter<'a, T> = &'a dyn Fn(&Message<T>) -> bool;

/// Mailbox construction settings.
#[derive(Debug, Clone, Default)]
pub struct MailboxConfig {
  /// Capacity bound. `None` means unbounded.
  pub max_size: Option<usize>,
}

impl MailboxConfig {
  pub fn unbounded() -> Self {
    Self { max_size: None }
  }

  /// Bounded mailbox. Minimum capacity is 1.
  pub fn bounded(max_size: usize) -> Self {
    Self {
      max_size: Some(max_size.max(1)),
    }
  }
}

struct MailboxState<T> {
  messages: VecDeque<Message<T>>,
  dead: bool,
}

struct MailboxInner<T> {
  address: Address,
  max_size: Option<usize>,
  state: Mutex<MailboxState<T>>,
  condvar: Condvar,
  dead_letters: DeadLetterOffice,
}

/// An actor's inbox. Cloning yields another handle to the same queue.
pub struct Mailbox<T> {
  inner: Arc<MailboxInner<T>>,
}

impl<T> Clone for Mailbox<T> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<T> Mailbox<T> {
  pub fn address(&self) -> Address {
    self.inner.address
  }

  pub fn max_size(&self) -> Option<usize> {
    self.inner.max_size
  }
}

impl<T: Payload> Default for Mailbox<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Payload> Mailbox<T> {
  /// Creates an unbounded mailbox reporting to the global dead-letter office.
  pub fn new() -> Self {
    Self::with_config(MailboxConfig::unbounded(), DeadLetterOffice::global())
  }

  /// Creates a bounded mailbox reporting to the global dead-letter office.
  pub fn bounded(max_size: usize) -> Self {
    Self::with_config(MailboxConfig::bounded(max_size), DeadLetterOffice::global())
  }

  pub fn with_config(config: MailboxConfig, dead_letters: DeadLetterOffice) -> Self {
    let address = Address::next();
    tracing::trace!(%address, max_size = ?config.max_size, "Created mailbox");
    Self {
      inner: Arc::new(MailboxInner {
        address,
        max_size: config.max_size,
        state: Mutex::new(MailboxState {
          messages: VecDeque::new(),
          dead: false,
        }),
        condvar: Condvar::new(),
        dead_letters,
      }),
    }
  }

  /// Enqueues a message. Never blocks and never fails.
  ///
  /// A dead or full mailbox routes the message to the dead-letter office
  /// and runs its payload cleanup.
  /// System events go to the head of the queue (so the newest system event
  /// is received first), regular messages to the tail.
  pub fn send(&self, mut message: Message<T>) {
    let mut state = self.inner.state.lock();

    let rejected = if state.dead {
      Some(DeadLetterReason::MailboxDead)
    } else if self.inner.max_size.is_some_and(|max| state.messages.len() >= max) {
      Some(DeadLetterReason::MailboxFull)
    } else {
      None
    };

    match rejected {
      Some(reason) => {
        // Waiters still re-check state.
        self.inner.condvar.notify_one();
        drop(state);
        self.inner.dead_letters.deliver(self.inner.address, reason, &message);
        message.cleanup();
      }
      None => {
        if message.is_system_event() {
          state.messages.push_front(message);
        } else {
          state.messages.push_back(message);
        }
        self.inner.condvar.notify_one();
      }
    }
  }

  /// Convenience for `send(Message::Regular(payload))`.
  pub fn tell(&self, payload: T) {
    self.send(Message::Regular(payload));
  }

  /// Removes and returns the first message accepted by `filter` (or any
  /// system event), waiting up to `timeout` for one to arrive.
  ///
  /// Fails with `MailboxDead` only if the mailbox was dead on entry. Returns
  /// `Ok(None)` when the budget runs out or the mailbox dies while waiting.
  /// `timeout = None`, or one too large to express as a deadline, waits
  /// without a deadline.
  pub fn check(&self, timeout: Option<Duration>, filter: Option<MessageFilter<'_, T>>) -> Result<Option<Message<T>>> {
    let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
    let mut state = self.inner.state.lock();

    if state.dead {
      return Err(ActorError::MailboxDead);
    }

    loop {
      if let Some(message) = take_first_match(&mut state.messages, filter) {
        return Ok(Some(message));
      }

      match deadline {
        Some(deadline) => {
          let remaining = deadline.saturating_duration_since(Instant::now());
          if remaining.is_zero() {
            return Ok(None);
          }
          self.inner.condvar.wait_for(&mut state, remaining);
        }
        None => self.inner.condvar.wait(&mut state),
      }

      if state.dead {
        return Ok(None);
      }
      // Spurious wakeup, unrelated message, or new match: rescan.
    }
  }

  /// Blocks until a matching message arrives.
  ///
  /// Unlike `check`, an exhausted `timeout` is an error (`ReceiveTimeout`),
  /// distinct from `MailboxDead`.
  pub fn receive(&self, timeout: Option<Duration>, filter: Option<MessageFilter<'_, T>>) -> Result<Message<T>> {
    let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

    loop {
      let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
      if let Some(message) = self.check(remaining, filter)? {
        return Ok(message);
      }
      if let Some(deadline) = deadline {
        if Instant::now() >= deadline {
          return Err(ActorError::ReceiveTimeout);
        }
      }
    }
  }

  /// Shuts the mailbox down. See [`Mailbox::shutdown_with`].
  pub fn shutdown(&self) -> Result<()> {
    self.shutdown_with(|| {})
  }

  /// Marks the mailbox dead, wakes every waiter and discards queued messages.
  ///
  /// `cleanup` runs under the mailbox lock before the queue is drained.
  /// Drained messages go to the dead-letter office and have their cleanup
  /// capability invoked after the lock is released.
  pub fn shutdown_with<F>(&self, cleanup: F) -> Result<()>
  where
    F: FnOnce(),
  {
    let drained = {
      let mut state = self.inner.state.lock();
      if state.dead {
        return Err(ActorError::MailboxDead);
      }
      cleanup();
      let drained = std::mem::take(&mut state.messages);
      state.dead = true;
      self.inner.condvar.notify_all();
      drained
    };

    tracing::debug!(address = %self.inner.address, drained = drained.len(), "Mailbox shut down");

    for mut message in drained {
      self.inner.dead_letters.deliver(self.inner.address, DeadLetterReason::Drained, &message);
      message.cleanup();
    }
    Ok(())
  }

  pub fn is_alive(&self) -> bool {
    !self.inner.state.lock().dead
  }

  pub fn len(&self) -> usize {
    self.inner.state.lock().messages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.state.lock().messages.is_empty()
  }

  /// Copy of the queued messages in receive order.
  pub fn snapshot(&self) -> Vec<Message<T>>
  where
    T: Clone,
  {
    self.inner.state.lock().messages.iter().cloned().collect()
  }
}

fn take_first_match<T>(messages: &mut VecDeque<Message<T>>, filter: Option<MessageFilter<'_, T>>) -> Option<Message<T>> {
  let index = messages
    .iter()
    .position(|m| m.is_system_event() || filter.map_or(true, |f| f(m)))?;
  messages.remove(index)
}

impl<T> fmt::Debug for Mailbox<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.inner.state.lock();
    f.debug_struct("Mailbox")
      .field("address", &self.inner.address)
      .field("size", &state.messages.len())
      .field("max_size", &self.inner.max_size)
      .field("dead", &state.dead)
      .finish()
  }
}
