//! Outcome notifications for a resolution pass

use crate::requirements::types::{ConflictReport, LoadSpec};

type ResolvedListener = Box<dyn FnMut(&LoadSpec)>;
type FailedListener = Box<dyn FnMut(&ConflictReport)>;

/// How a completed pass ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Resolved(LoadSpec),
    Failed(ConflictReport),
}

/// Listener lists for the two pass outcomes.
///
/// Listeners run synchronously, in the order they were added.
#[derive(Default)]
pub struct Notifier {
    resolved: Vec<ResolvedListener>,
    failed: Vec<FailedListener>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_resolved(&mut self, listener: impl FnMut(&LoadSpec) + 'static) {
        self.resolved.push(Box::new(listener));
    }

    pub fn on_failed(&mut self, listener: impl FnMut(&ConflictReport) + 'static) {
        self.failed.push(Box::new(listener));
    }

    /// Deliver an outcome to the matching listeners only
    pub fn emit(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Resolved(spec) => {
                for listener in &mut self.resolved {
                    listener(spec);
                }
            }
            Outcome::Failed(report) => {
                for listener in &mut self.failed {
                    listener(report);
                }
            }
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("resolved", &self.resolved.len())
            .field("failed", &self.failed.len())
            .finish()
    }
}
