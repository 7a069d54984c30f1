//! Cooperative cancellation (spec.md §4.9, §5).
//!
//! Components must observe this token at every suspension point named in
//! spec.md §5: SMT solver invocations, disk I/O, and between file batches
//! of size ≤64. Cheap to clone (an `Arc<AtomicBool>`), so it is passed by
//! value into worker closures the way the teacher passes `Arc`-wrapped
//! shared state into `rayon`/`tokio` tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `Err` if cancelled, for use with `?` at suspension points.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("operation was cancelled")]
pub struct Cancelled;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled_and_observes_cancel_across_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.check().is_err());
    }
}
