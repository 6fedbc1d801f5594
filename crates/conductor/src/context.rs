//! Reporter trait and run cancellation
//!
//! These let the engine be used without depending on a particular
//! terminal UI or signal-handling scheme: the CLI supplies an indicatif
//! reporter, tests and embedders use [`Silent`] and drive [`Cancel`]
//! however they like.

use crate::backend::Action;
use crate::types::Record;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Receives state transitions for display.
///
/// The engine never blocks on the reporter and runs correctly with the
/// no-op [`Silent`] implementation. Callbacks take `&self` because
/// entries within a wave are driven from multiple worker threads.
pub trait Reporter: Send + Sync {
    /// A wave is about to be driven
    fn wave_started(&self, _index: usize, _total: usize, _names: &[String]) {}

    /// An entry's request was accepted by the backend
    fn entry_submitted(&self, _name: &str, _action: Action) {}

    /// An entry reached a terminal state
    fn entry_finished(&self, _record: &Record) {}
}

/// Reporter that discards everything
pub struct Silent;

impl Reporter for Silent {}

/// Run-level cancellation flag, shareable across threads.
///
/// Once set, the engine stops issuing new submissions; entries already
/// submitted finish polling to a terminal state or time out. Nothing sent
/// to the backend is retracted.
#[derive(Debug, Clone, Default)]
pub struct Cancel(Arc<AtomicBool>);

impl Cancel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_is_shared() {
        let cancel = Cancel::new();
        let clone = cancel.clone();
        assert!(!clone.is_cancelled());
        cancel.cancel();
        assert!(clone.is_cancelled());
    }
}
