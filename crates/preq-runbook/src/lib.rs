//! Event-triggered runbook actions.
//!
//! A runbook is a YAML list of actions (chat webhook, issue tracker webhook,
//! local process). Each action is built and validated once, optionally
//! filtered by a regex on the event's CRE id, and then run for every
//! detected event record in order. The first failure stops the run.

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod factory;
pub mod filter;
pub mod handler;
pub mod runbook;
pub mod secret;

pub use config::{
    ActionConfig, ActionKind, ActionSection, ExecConfig, JiraConfig, RunbookConfig, SlackConfig,
};
pub use context::DispatchContext;
pub use dispatcher::{DispatchStats, Dispatcher};
pub use error::{ActionError, ConfigError, Result, RunbookError};
pub use factory::ActionFactory;
pub use filter::FilteredAction;
pub use handler::{Action, ExecAction, JiraAction, SlackAction};
pub use runbook::{runbook, Runbook};
pub use secret::{resolve_secret, EnvSecrets, SecretSource, StaticSecrets};
