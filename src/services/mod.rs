//! Base services booted by `ActorSystem::start`.

pub mod fanout;
pub mod group;
pub mod group_manager;
pub mod incidents;

pub use fanout::{FanoutRequest, NotificationFanout};
pub use group::{ServiceGroup, ServiceSlot};
pub use group_manager::{GroupManager, GroupRequest, GroupSnapshot};
pub use incidents::{IncidentLog, IncidentReporter};

/// Registry names of the base services.
pub const NOTIFICATIONS_FANOUT: &str = "notifications_fanout";
pub const INCIDENT_REPORTER: &str = "incident_reporter";
pub const GROUP_MANAGER: &str = "group_manager";
