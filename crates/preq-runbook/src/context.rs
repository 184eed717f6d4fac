//! Cancellation and deadline shared by a dispatch run.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ActionError;

/// Context handed to every action execution in a dispatch run.
///
/// Cancelling the token aborts the in-flight HTTP request or kills the
/// in-flight child process. The optional deadline bounds the whole run.
#[derive(Debug, Clone, Default)]
pub struct DispatchContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl DispatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing token, e.g. one cancelled on Ctrl-C.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check the context before starting new work.
    pub fn check(&self) -> Result<(), ActionError> {
        if self.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ActionError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drive `fut` until it completes, the token is cancelled, or the deadline
    /// passes. On cancellation or deadline the future is dropped.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ActionError>
    where
        F: Future<Output = Result<T, ActionError>>,
    {
        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .unwrap_or_else(|_| Err(ActionError::DeadlineExceeded)),
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ActionError::Cancelled),
            result = bounded => result,
        }
    }
}
