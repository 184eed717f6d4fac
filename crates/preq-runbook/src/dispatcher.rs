//! Sequential, fail-fast dispatch of records to actions.
//!
//! Actions run in configuration order. For each action every admitted record
//! is processed in input order before the next action starts. The first
//! failure stops the run; nothing is retried.

use preq_core::EventRecord;
use tracing::{debug, info, warn};

use crate::context::DispatchContext;
use crate::error::{ActionError, Result, RunbookError};
use crate::filter::FilteredAction;

/// Counters for a completed dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Action executions that succeeded.
    pub executed: usize,
    /// (action, record) pairs rejected by a filter.
    pub skipped: usize,
}

/// Runs built actions against event records.
#[derive(Debug, Default)]
pub struct Dispatcher {
    actions: Vec<FilteredAction>,
}

impl Dispatcher {
    pub fn new(actions: Vec<FilteredAction>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[FilteredAction] {
        &self.actions
    }

    /// Dispatch every record to every admitting action.
    ///
    /// Cancellation and the context deadline are checked before each
    /// execution and also abort the one in flight.
    pub async fn dispatch(
        &self,
        ctx: &DispatchContext,
        records: &[EventRecord],
    ) -> Result<DispatchStats> {
        info!(
            actions = self.actions.len(),
            records = records.len(),
            "Dispatch started"
        );
        let mut stats = DispatchStats::default();

        for (action_index, action) in self.actions.iter().enumerate() {
            for (record_index, record) in records.iter().enumerate() {
                let fail = |source: ActionError| RunbookError::Dispatch {
                    action: action_index,
                    kind: action.kind(),
                    record: record_index,
                    source,
                };

                ctx.check().map_err(fail)?;

                if !action.admits(record) {
                    debug!(
                        action = action_index,
                        record = record_index,
                        cre_id = record.cre_id(),
                        "Record filtered out"
                    );
                    stats.skipped += 1;
                    continue;
                }

                if let Err(source) = action.action().execute(ctx, record).await {
                    warn!(
                        action = action_index,
                        kind = %action.kind(),
                        record = record_index,
                        error = %source,
                        "Action failed"
                    );
                    return Err(fail(source));
                }
                stats.executed += 1;
            }
        }

        info!(
            executed = stats.executed,
            skipped = stats.skipped,
            "Dispatch finished"
        );
        Ok(stats)
    }
}
