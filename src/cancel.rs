//! A cancellation handle polled between phases and between work items by
//! long-running computations (DFS, the semi-dominator loop, retained
//! propagation).
//!
//! Kept deliberately tiny: an `Arc<AtomicBool>` rather than a channel or a
//! context-object hierarchy, since the only operations the spec requires
//! are "trip it" and "is it tripped".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shareable flag a caller can trip to abort a long-running computation.
#[derive(Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Poll whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled_and_trips_once() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
