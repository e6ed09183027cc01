//! Task context and observer traits
//!
//! These traits let the engine report progress and ask for confirmation
//! without depending on a particular terminal UI.

use crate::types::{Action, ResourceIdentity};
use std::fmt;

/// Step of the reconciliation state machine
///
/// `Fetching → Deciding → {Creating | Updating | Noop} →
/// (StateTransitioning) → Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Fetching,
    Deciding,
    Creating,
    Updating,
    Noop,
    StateTransitioning,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetching => "fetching",
            Self::Deciding => "deciding",
            Self::Creating => "creating",
            Self::Updating => "updating",
            Self::Noop => "noop",
            Self::StateTransitioning => "state-transitioning",
            Self::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Progress callback for reconciliation
///
/// Implement this trait to receive progress updates while tasks run.
pub trait ProgressCallback {
    /// Called before a task starts fetching
    fn on_task_start(&mut self, identity: &ResourceIdentity);

    /// Called on every state-machine transition
    fn on_phase(&mut self, identity: &ResourceIdentity, phase: Phase);

    /// Called when a task finishes successfully
    fn on_task_complete(&mut self, identity: &ResourceIdentity, action: Action);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback {
    /// Ask the user to confirm an action
    ///
    /// Returns `true` if the user confirmed.
    fn confirm(&mut self, prompt: &str) -> std::io::Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_task_start(&mut self, _identity: &ResourceIdentity) {}
    fn on_phase(&mut self, _identity: &ResourceIdentity, _phase: Phase) {}
    fn on_task_complete(&mut self, _identity: &ResourceIdentity, _action: Action) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> std::io::Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> std::io::Result<bool> {
        Ok(false)
    }
}

/// Context handed to create/update hooks
///
/// Hooks report extra phases (e.g. a lifecycle transition) through it.
pub struct TaskContext<'a> {
    identity: &'a ResourceIdentity,
    progress: &'a mut dyn ProgressCallback,
}

impl<'a> TaskContext<'a> {
    pub fn new(identity: &'a ResourceIdentity, progress: &'a mut dyn ProgressCallback) -> Self {
        Self { identity, progress }
    }

    /// Identity of the resource being reconciled
    pub fn identity(&self) -> &ResourceIdentity {
        self.identity
    }

    /// Report a state-machine transition
    pub fn phase(&mut self, phase: Phase) {
        log::debug!("{}: {phase}", self.identity);
        self.progress.on_phase(self.identity, phase);
    }
}
