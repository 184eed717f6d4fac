//! Action trait and its implementations.
//!
//! Every configured runbook entry becomes one boxed [`Action`]. Actions are
//! built once, validated up front, and executed for each event record.

pub mod exec;
pub mod jira;
pub mod slack;
mod webhook;

use async_trait::async_trait;
use preq_core::EventRecord;

use crate::config::ActionKind;
use crate::context::DispatchContext;
use crate::error::ActionError;

pub use exec::ExecAction;
pub use jira::JiraAction;
pub use slack::SlackAction;

/// A side effect triggered by an event record.
#[async_trait]
pub trait Action: Send + Sync {
    fn kind(&self) -> ActionKind;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;

    /// Run the action for one record.
    async fn execute(&self, ctx: &DispatchContext, record: &EventRecord)
        -> Result<(), ActionError>;
}
