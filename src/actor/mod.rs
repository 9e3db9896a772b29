//! Minimal actors: a behaviour driven by a receive loop over one mailbox.
//!
//! There is no method-dispatch proxy here. An actor is a `Behavior` that is
//! handed each regular payload in order, plus system events first.

mod exit_guard;
mod handle;

pub use handle::ActorHandle;

use exit_guard::ExitGuard;

use crate::error::{ActorError, Result};
use crate::runtime::{
  Address, CountDownLatch, Mailbox, MailboxConfig, Message, Notification, Payload, Role, SystemEvent,
};
use crate::system::ActorSystem;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// What the run loop does after a message has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Stop,
}

/// Per-actor state handed to every callback.
pub struct ActorContext<T> {
  system: ActorSystem,
  mailbox: Mailbox<T>,
  name: Option<String>,
}

impl<T: Payload> ActorContext<T> {
  pub fn system(&self) -> &ActorSystem {
    &self.system
  }

  pub fn address(&self) -> Address {
    self.mailbox.address()
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  /// The actor's own mailbox, e.g. for self-sends or selective receives.
  pub fn mailbox(&self) -> &Mailbox<T> {
    &self.mailbox
  }
}

/// Actor behaviour. Runs on the actor's own unit; never shared across threads.
pub trait Behavior: Send + 'static {
  type Payload: Payload;

  fn handle(&mut self, payload: Self::Payload, ctx: &ActorContext<Self::Payload>) -> Flow;

  /// Called for system events. The default stops on `Terminate`.
  fn on_system_event(&mut self, event: SystemEvent, ctx: &ActorContext<Self::Payload>) -> Flow {
    let _ = ctx;
    match event {
      SystemEvent::Terminate => Flow::Stop,
      _ => Flow::Continue,
    }
  }

  fn on_start(&mut self, _ctx: &ActorContext<Self::Payload>) {}

  /// Called after the loop ends cleanly (not after a panic).
  fn on_stop(&mut self, _ctx: &ActorContext<Self::Payload>) {}
}

pub(crate) struct ActorCore<T> {
  name: Option<String>,
  mailbox: Mailbox<T>,
  exited: CountDownLatch,
}

impl<T> fmt::Debug for ActorCore<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Actor")
      .field("address", &self.mailbox.address())
      .field("name", &self.name)
      .field("exited", &self.exited.is_open())
      .finish()
  }
}

impl<T: Payload> ActorHandle for ActorCore<T> {
  fn address(&self) -> Address {
    self.mailbox.address()
  }

  fn name(&self) -> Option<String> {
    self.name.clone()
  }

  fn terminate(&self) -> Result<()> {
    if self.exited.is_open() || !self.mailbox.is_alive() {
      return Err(ActorError::DeadActor);
    }
    self.mailbox.send(Message::System(SystemEvent::Terminate));
    Ok(())
  }

  fn join(&self, timeout: Option<Duration>) -> Result<()> {
    if self.exited.wait(timeout) {
      Ok(())
    } else {
      Err(ActorError::Timeout)
    }
  }

  /// Shuts the mailbox down under the run loop, which then exits at its next
  /// receive. A behaviour stuck inside `handle` is not interrupted.
  fn kill(&self) -> Result<()> {
    if self.exited.is_open() {
      return Err(ActorError::DeadActor);
    }
    tracing::debug!(address = %self.mailbox.address(), name = ?self.name, "Killing actor");
    self.mailbox.shutdown()
  }
}

/// Handle to a running actor. Cloning yields another handle to the same actor.
pub struct Actor<T> {
  core: Arc<ActorCore<T>>,
}

impl<T> Clone for Actor<T> {
  fn clone(&self) -> Self {
    Self {
      core: Arc::clone(&self.core),
    }
  }
}

impl<T> fmt::Debug for Actor<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.core.fmt(f)
  }
}

impl<T: Payload> Actor<T> {
  pub fn address(&self) -> Address {
    self.core.mailbox.address()
  }

  pub fn name(&self) -> Option<&str> {
    self.core.name.as_deref()
  }

  pub fn mailbox(&self) -> &Mailbox<T> {
    &self.core.mailbox
  }

  /// Non-blocking send; see [`Mailbox::send`].
  pub fn send(&self, message: Message<T>) {
    self.core.mailbox.send(message);
  }

  pub fn tell(&self, payload: T) {
    self.core.mailbox.tell(payload);
  }

  /// False once the run loop has exited.
  pub fn is_alive(&self) -> bool {
    !self.core.exited.is_open()
  }

  pub fn terminate(&self) -> Result<()> {
    self.core.terminate()
  }

  pub fn join(&self, timeout: Option<Duration>) -> Result<()> {
    self.core.join(timeout)
  }

  pub fn kill(&self) -> Result<()> {
    self.core.kill()
  }

  /// Type-erased handle, as stored in the registry.
  pub fn handle(&self) -> Arc<dyn ActorHandle> {
    self.core.clone()
  }
}

/// Creates the actor's mailbox and starts its run loop on a new `Actor` unit.
pub(crate) fn spawn<B: Behavior>(
  system: &ActorSystem,
  name: Option<String>,
  behavior: B,
  mailbox_config: MailboxConfig,
) -> Result<Actor<B::Payload>> {
  let mailbox = Mailbox::with_config(mailbox_config, system.dead_letters().clone());
  let core = Arc::new(ActorCore {
    name: name.clone(),
    mailbox: mailbox.clone(),
    exited: CountDownLatch::new(1),
  });
  let address = mailbox.address();

  let handle: Arc<dyn ActorHandle> = core.clone();
  let context = ActorContext {
    system: system.clone(),
    mailbox,
    name: name.clone(),
  };
  let loop_core = Arc::clone(&core);

  system.spawn_unit(Role::Actor, name.clone(), Some(Arc::downgrade(&handle)), move || {
    run_loop(behavior, context, loop_core);
  })?;

  system.event_bus().publish_quiet(Notification::ActorStarted {
    address,
    name,
    role: Role::Actor,
  });
  Ok(Actor { core })
}

fn run_loop<B: Behavior>(mut behavior: B, ctx: ActorContext<B::Payload>, core: Arc<ActorCore<B::Payload>>) {
  let mut guard = ExitGuard::new(ctx.system.clone(), Arc::clone(&core));
  let address = ctx.address();
  tracing::debug!(%address, name = ?ctx.name, "Actor started");

  behavior.on_start(&ctx);
  loop {
    let flow = match ctx.mailbox.receive(None, None) {
      Ok(Message::Regular(payload)) => behavior.handle(payload, &ctx),
      Ok(Message::System(event)) => behavior.on_system_event(event, &ctx),
      Err(ActorError::MailboxDead) => {
        tracing::debug!(%address, "Mailbox died under running actor (killed)");
        Flow::Stop
      }
      Err(e) => {
        tracing::warn!(%address, "Actor receive failed: {}", e);
        Flow::Stop
      }
    };
    if flow == Flow::Stop {
      break;
    }
  }
  behavior.on_stop(&ctx);

  tracing::debug!(%address, name = ?ctx.name, "Actor stopped");
  guard.waive();
}
