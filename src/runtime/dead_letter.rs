// src/runtime/dead_letter.rs

//! Sink for messages that could not be delivered.

use super::message::{Address, Message, Payload};
use crate::config;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Why a message ended up in the dead-letter office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeadLetterReason {
  /// Sent to a mailbox that was already shut down.
  MailboxDead,
  /// Sent to a bounded mailbox that was at capacity.
  MailboxFull,
  /// Still queued when the mailbox shut down.
  Drained,
}

impl fmt::Display for DeadLetterReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      DeadLetterReason::MailboxDead => "mailbox is dead",
      DeadLetterReason::MailboxFull => "mailbox is full",
      DeadLetterReason::Drained => "drained on shutdown",
    };
    f.write_str(s)
  }
}

/// Record of one discarded message, as seen by a tap subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
  pub address: Address,
  pub reason: DeadLetterReason,
  /// `Debug` rendering of the discarded message.
  pub description: String,
}

#[derive(Debug, Default)]
struct OfficeInner {
  count: AtomicU64,
  tap: RwLock<Option<async_channel::Sender<DeadLetter>>>,
}

/// Counts, logs and optionally forwards discarded messages.
/// Cloning yields another handle to the same office.
#[derive(Debug, Clone, Default)]
pub struct DeadLetterOffice {
  inner: Arc<OfficeInner>,
}

static GLOBAL_OFFICE: Lazy<DeadLetterOffice> = Lazy::new(DeadLetterOffice::new);

impl DeadLetterOffice {
  pub fn new() -> Self {
    Self::default()
  }

  /// The process-wide office used by mailboxes created without an explicit one.
  pub fn global() -> DeadLetterOffice {
    GLOBAL_OFFICE.clone()
  }

  /// Records a discarded message. Never blocks and never fails.
  pub(crate) fn deliver<T: Payload>(&self, address: Address, reason: DeadLetterReason, message: &Message<T>) {
    self.inner.count.fetch_add(1, Ordering::Relaxed);

    if config::debug_enabled() {
      tracing::debug!(%address, %reason, ?message, "Discarded message");
    }

    let tap = self.inner.tap.read();
    if let Some(tx) = tap.as_ref() {
      let letter = DeadLetter {
        address,
        reason,
        description: format!("{:?}", message),
      };
      // A full or closed tap just loses the record.
      if let Err(e) = tx.try_send(letter) {
        tracing::trace!(%address, "Dead-letter tap did not accept record: {}", e);
      }
    }
  }

  /// Installs a bounded tap receiving a record for every future dead letter.
  /// Replaces any previously installed tap.
  pub fn tap(&self, capacity: usize) -> async_channel::Receiver<DeadLetter> {
    let (tx, rx) = async_channel::bounded(capacity.max(1));
    *self.inner.tap.write() = Some(tx);
    rx
  }

  /// Removes the tap, closing its channel.
  pub fn untap(&self) {
    if let Some(tx) = self.inner.tap.write().take() {
      tx.close();
    }
  }

  /// Total number of dead letters recorded by this office.
  pub fn count(&self) -> u64 {
    self.inner.count.load(Ordering::Relaxed)
  }
}
