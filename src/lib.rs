//! Conversational intake agent.
//!
//! Collects event registrations and job-vacancy applications through
//! multi-step guided dialogs with a review/edit cycle, relays posts
//! from monitored channels to subscribers, and sends scheduled digest
//! reports and reminders.
//!
//! The messaging transport is abstracted behind
//! [`gateway::MessageGate`]; all collected data lives in volatile
//! process memory.

pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod ledger;
pub mod relay;
pub mod report;
pub mod sched;
pub mod session;

pub use config::Config;
pub use dispatch::Dispatcher;
pub use flow::Flow;
pub use gateway::{AttachmentRef, IncomingMessage, MessageGate, PromptOptions, UserId};
pub use ledger::Ledger;
pub use session::{FormVariant, SessionStore, Step};
