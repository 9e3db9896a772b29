use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive] // Allows adding more variants later without breaking change
pub enum ActorError {
  // --- Mailbox Errors ---
  #[error("Mailbox is dead")]
  MailboxDead, // Operation attempted on a mailbox that was already shut down

  #[error("Timed out waiting for a message")]
  ReceiveTimeout, // Nothing matched within the requested window; the mailbox is still alive

  // --- Actor Errors ---
  #[error("Actor is dead")]
  DeadActor, // Target already terminated. Routinely swallowed by bulk operations.

  #[error("Operation timed out")]
  Timeout,

  // --- System Errors ---
  #[error("Actor system already started")]
  AlreadyStarted,

  #[error("{0} actor unit(s) still active")]
  StillActive(usize),

  #[error("Failed to spawn execution unit: {0}")]
  Spawn(#[from] io::Error),

  // --- Internal Errors ---
  #[error("Internal runtime error: {0}")]
  Internal(String),
}

impl ActorError {
  /// True for the "target is already gone" outcomes that bulk operations ignore.
  pub fn is_gone(&self) -> bool {
    matches!(self, ActorError::DeadActor | ActorError::MailboxDead)
  }
}

pub type Result<T, E = ActorError> = std::result::Result<T, E>;
