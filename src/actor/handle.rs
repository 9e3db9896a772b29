use crate::error::Result;
use crate::runtime::Address;

use std::fmt;
use std::time::Duration;

/// The capability the actor system needs from every actor it manages.
///
/// Every method may fail with `ActorError::DeadActor` when the target has
/// already terminated; bulk callers treat that as expected.
pub trait ActorHandle: Send + Sync + fmt::Debug {
  fn address(&self) -> Address;

  fn name(&self) -> Option<String> {
    None
  }

  /// Asynchronous request for graceful termination.
  fn terminate(&self) -> Result<()>;

  /// Blocks until the actor has fully terminated, or fails with
  /// `ActorError::Timeout` once `timeout` elapses (`None` waits forever).
  fn join(&self, timeout: Option<Duration>) -> Result<()>;

  /// Forced termination. May also fail with `ActorError::MailboxDead`.
  fn kill(&self) -> Result<()>;
}
