//! Local process action.
//!
//! Spawns the configured program directly (no shell) with templated
//! arguments. The event record is written to the child's stdin as JSON;
//! stdout and stderr are inherited from the dispatcher.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use preq_core::{EventRecord, Template};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::Action;
use crate::config::{ActionKind, ExecConfig};
use crate::context::DispatchContext;
use crate::error::{ActionError, ConfigError};

/// Handler for `exec` actions.
#[derive(Debug)]
pub struct ExecAction {
    path: PathBuf,
    args: Vec<Template>,
}

impl ExecAction {
    /// Validate the config and compile every argument template.
    pub fn new(config: &ExecConfig) -> Result<Self, ConfigError> {
        if config.path.is_empty() {
            return Err(ConfigError::MissingField("exec.path"));
        }
        let args = config
            .args
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let name = format!("exec-arg[{i}]");
                Template::compile(&name, source).map_err(|source| ConfigError::Template {
                    field: format!("exec.args[{i}]"),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            path: PathBuf::from(&config.path),
            args,
        })
    }

    fn render_args(&self, record: &EventRecord) -> Result<Vec<String>, ActionError> {
        self.args
            .iter()
            .map(|t| t.render(record).map_err(ActionError::from))
            .collect()
    }

    fn spawn(&self, args: &[String]) -> Result<Child, ActionError> {
        Command::new(&self.path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ActionError::Spawn {
                path: self.path.clone(),
                source,
            })
    }

    /// Write the record to stdin, close it, and wait for exit.
    async fn feed_and_wait(&self, child: &mut Child, input: &[u8]) -> Result<ExitStatus, ActionError> {
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(input).await {
                Ok(()) => {}
                // The child may exit without reading its input.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!(path = %self.path.display(), "Child closed stdin early");
                }
                Err(source) => {
                    return Err(ActionError::Stdin {
                        path: self.path.clone(),
                        source,
                    })
                }
            }
        }

        child.wait().await.map_err(|source| ActionError::Wait {
            path: self.path.clone(),
            source,
        })
    }
}

#[async_trait]
impl Action for ExecAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Exec
    }

    fn describe(&self) -> String {
        format!("Run {}", self.path.display())
    }

    async fn execute(
        &self,
        ctx: &DispatchContext,
        record: &EventRecord,
    ) -> Result<(), ActionError> {
        let args = self.render_args(record)?;
        let input = serde_json::to_vec(record)?;
        debug!(path = %self.path.display(), args = ?args, "Spawning process");

        let mut child = self.spawn(&args)?;
        let status = match ctx.run(self.feed_and_wait(&mut child, &input)).await {
            Ok(status) => status,
            Err(err @ (ActionError::Cancelled | ActionError::DeadlineExceeded)) => {
                // Kill and reap before reporting.
                if let Err(e) = child.kill().await {
                    warn!(path = %self.path.display(), error = %e, "Failed to kill process");
                }
                info!(path = %self.path.display(), reason = %err, "Process killed");
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        if !status.success() {
            warn!(path = %self.path.display(), %status, "Process exited unsuccessfully");
            return Err(ActionError::Exit {
                path: self.path.clone(),
                status,
            });
        }

        info!(
            cre_id = record.cre_id(),
            path = %self.path.display(),
            "Process completed"
        );
        Ok(())
    }
}
