//! Run context - deadline and cancellation passed to every check run

use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Why a bounded operation did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    /// The run deadline passed
    DeadlineExceeded,
    /// The run was cancelled by its owner
    Cancelled,
}

/// Context passed to checks during execution
///
/// Every network operation a check performs goes through [`RunContext::bound`],
/// so a run against an unreachable target ends by the deadline at the latest.
#[derive(Debug, Clone)]
pub struct RunContext {
    deadline: Instant,
    cancellation: CancellationToken,
}

impl RunContext {
    /// Create a context whose deadline is `timeout` from now
    ///
    /// A timeout past the clock's range yields a deadline roughly thirty years out.
    pub fn new(timeout: Duration) -> Self {
        let now = Instant::now();
        Self::with_deadline(now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE))
    }

    /// Create a context with an absolute deadline
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline,
            cancellation: CancellationToken::new(),
        }
    }

    /// Attach a cancellation token owned by the caller
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline (zero once it has passed)
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Run `fut` until it completes, the deadline passes, or the run is cancelled
    pub async fn bound<F>(&self, fut: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(Interrupted::Cancelled),
            res = timeout_at(self.deadline, fut) => res.map_err(|_| Interrupted::DeadlineExceeded),
        }
    }
}
