use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::ProfilerError;

/// Cancellation signal checked before every remote call of an analysis.
///
/// Clones share the same token, so a handle can be tripped from another
/// thread while the pipeline blocks on a request.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
            || self
                .deadline
                .map(|deadline| Instant::now() >= deadline)
                .unwrap_or(false)
    }

    pub fn check(&self) -> Result<(), ProfilerError> {
        if self.is_cancelled() {
            return Err(ProfilerError::Cancelled);
        }
        Ok(())
    }
}
