// src/lib.rs

//! rcell - A thread-based actor concurrency core.
//!
//! Each actor owns a mailbox and runs on its own OS thread. System events
//! (terminate, exit, signals) jump ahead of regular traffic, undeliverable
//! messages go to a dead-letter office, and an `ActorSystem` coordinates
//! spawning, naming and bulk shutdown of every live actor.

/// Actors: behaviours driven by a receive loop, and their handles.
pub mod actor;
/// Per-system settings and the process-wide debug flag.
pub mod config;
/// Defines the error type used throughout the library.
pub mod error;
/// Name → actor handle directory.
pub mod registry;
/// Core primitives: messages, mailboxes, dead letters, execution units and notifications.
pub mod runtime;
/// Base services booted by `ActorSystem::start`.
pub mod services;
/// The `ActorSystem`: spawning, scoping and coordinated shutdown.
pub mod system;

// Re-export core types for user convenience (e.g. `rcell::Mailbox`, `rcell::ActorSystem`).
pub use actor::{Actor, ActorContext, ActorHandle, Behavior, Flow};
pub use config::{debug_enabled, set_debug, SystemConfig};
pub use error::{ActorError, Result};
pub use registry::Registry;
pub use runtime::{
  Address, DeadLetter, DeadLetterOffice, DeadLetterReason, EventBus, Incident, Mailbox, MailboxConfig, Message,
  MessageFilter, Notification, Payload, Role, SystemEvent, UnitId, UnitSummary,
};
pub use services::{GroupSnapshot, ServiceGroup, ServiceSlot};
pub use system::{ActorSystem, ShutdownReport};
