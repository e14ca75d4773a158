//! The narrow capability the engine needs from its host: progress,
//! cancellation and live violation notifications.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::options::DrcCategory;
use crate::violation::DrcViolation;

pub trait DrcObserver {
    /// Called once for every record accepted by the sink.
    fn on_violation(&mut self, _violation: &DrcViolation) {}

    /// `done` of `total` reference items of `category` processed.
    fn on_progress(&mut self, _category: DrcCategory, _done: usize, _total: usize) {}

    /// Polled before each reference item.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl DrcObserver for NullObserver {}

/// Shared cancellation flag. Clones observe the same flag, so one clone can
/// be handed to the engine while another cancels from elsewhere.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl DrcObserver for CancelToken {
    fn is_cancelled(&self) -> bool {
        self.is_set()
    }
}

/// Collects every notification; used by tests and simple hosts.
#[derive(Debug, Clone, Default)]
pub struct CollectingObserver {
    pub violations: Vec<DrcViolation>,
    pub progress: Vec<(DrcCategory, usize, usize)>,
    /// Cancel once this many progress ticks have been seen.
    pub cancel_after: Option<usize>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_after(ticks: usize) -> Self {
        Self {
            cancel_after: Some(ticks),
            ..Self::default()
        }
    }
}

impl DrcObserver for CollectingObserver {
    fn on_violation(&mut self, violation: &DrcViolation) {
        self.violations.push(violation.clone());
    }

    fn on_progress(&mut self, category: DrcCategory, done: usize, total: usize) {
        self.progress.push((category, done, total));
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_after
            .is_some_and(|limit| self.progress.len() >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let handed_out = token.clone();
        assert!(!handed_out.is_cancelled());
        token.cancel();
        assert!(handed_out.is_cancelled());
    }
}
