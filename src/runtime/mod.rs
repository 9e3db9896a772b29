// src/runtime/mod.rs

//! Core concurrency primitives: Messages, Mailboxes, execution units and notifications.

pub mod dead_letter;
pub mod event_bus;
pub mod latch;
pub mod mailbox;
pub mod message;
pub mod notifications;
pub mod thread_group;
pub mod waitgroup;

pub use dead_letter::{DeadLetter, DeadLetterOffice, DeadLetterReason};
pub use mailbox::{Mailbox, MailboxConfig, MessageFilter};
pub use message::{Address, Message, Payload, SystemEvent};

// System Coordination
pub use event_bus::EventBus;
pub use notifications::{Incident, Notification, Role};
pub use thread_group::{ThreadGroup, UnitId, UnitInfo, UnitSummary};

// Sync Primitives
pub(crate) use latch::CountDownLatch;
pub(crate) use waitgroup::WaitGroup;
