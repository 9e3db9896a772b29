use crate::actor::{ActorContext, Behavior, Flow};
use crate::runtime::{Mailbox, Payload, UnitSummary};

/// Answer to [`GroupRequest::Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapshot {
  pub units: Vec<UnitSummary>,
}

impl Payload for GroupSnapshot {}

/// Requests accepted by [`GroupManager`].
#[derive(Debug)]
pub enum GroupRequest {
  /// Reply with the current unit summary.
  Snapshot { reply: Mailbox<GroupSnapshot> },
}

impl Payload for GroupRequest {
  fn cleanup(&mut self) {
    // Discarded before it was answered: fail the caller's receive right away.
    let GroupRequest::Snapshot { reply } = self;
    let _ = reply.shutdown();
  }
}

/// Base service reporting on the system's thread group.
#[derive(Debug, Default)]
pub struct GroupManager;

impl Behavior for GroupManager {
  type Payload = GroupRequest;

  fn handle(&mut self, request: GroupRequest, ctx: &ActorContext<GroupRequest>) -> Flow {
    match request {
      GroupRequest::Snapshot { reply } => {
        reply.tell(GroupSnapshot {
          units: ctx.system().stack_summary(),
        });
      }
    }
    Flow::Continue
  }
}
