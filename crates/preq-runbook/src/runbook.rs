//! Runbook entry points.

use std::path::Path;

use preq_core::EventRecord;
use tracing::info;

use crate::config::RunbookConfig;
use crate::context::DispatchContext;
use crate::dispatcher::{DispatchStats, Dispatcher};
use crate::error::Result;
use crate::factory::ActionFactory;

/// A loaded, fully validated runbook.
#[derive(Debug)]
pub struct Runbook {
    dispatcher: Dispatcher,
}

impl Runbook {
    /// Build every action in `config`. Fails on the first invalid entry.
    pub fn from_config(config: &RunbookConfig, factory: &ActionFactory) -> Result<Self> {
        let actions = factory.build(config)?;
        Ok(Self {
            dispatcher: Dispatcher::new(actions),
        })
    }

    pub fn from_path(path: impl AsRef<Path>, factory: &ActionFactory) -> Result<Self> {
        Self::from_config(&RunbookConfig::load(path.as_ref())?, factory)
    }

    pub fn from_yaml(content: &str, factory: &ActionFactory) -> Result<Self> {
        Self::from_config(&RunbookConfig::from_yaml(content)?, factory)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn run(&self, ctx: &DispatchContext, records: &[EventRecord]) -> Result<DispatchStats> {
        self.dispatcher.dispatch(ctx, records).await
    }
}

/// Load the runbook at `config_path` and dispatch `records` through it.
///
/// Secrets are read from the process environment. Nothing is dispatched if
/// any action fails to build.
pub async fn runbook(
    ctx: &DispatchContext,
    config_path: impl AsRef<Path>,
    records: &[EventRecord],
) -> Result<()> {
    let config_path = config_path.as_ref();
    let runbook = Runbook::from_path(config_path, &ActionFactory::default())?;
    let stats = runbook.run(ctx, records).await?;
    info!(
        path = %config_path.display(),
        executed = stats.executed,
        skipped = stats.skipped,
        "Runbook completed"
    );
    Ok(())
}
