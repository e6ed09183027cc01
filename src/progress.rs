//! Progress display for sync runs.

use declarative::{Action, Phase, ProgressCallback, ResourceIdentity};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner showing the resource being reconciled
pub struct SyncProgress {
    bar: ProgressBar,
}

impl SyncProgress {
    pub fn new(quiet: bool) -> Self {
        if quiet {
            return Self::with_bar(ProgressBar::hidden());
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{pos}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self { bar }
    }

    /// Number of completed resources
    pub fn completed(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for SyncProgress {
    fn on_task_start(&mut self, identity: &ResourceIdentity) {
        self.bar.set_message(identity.to_string());
    }

    fn on_phase(&mut self, identity: &ResourceIdentity, phase: Phase) {
        self.bar.set_message(format!("{identity} ({phase})"));
    }

    fn on_task_complete(&mut self, _identity: &ResourceIdentity, _action: Action) {
        self.bar.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_counts_completions() {
        let mut progress = SyncProgress::new(true);
        let identity = ResourceIdentity::new("event", "OrderCreated");

        progress.on_task_start(&identity);
        progress.on_phase(&identity, Phase::Creating);
        progress.on_task_complete(&identity, Action::Created);
        progress.on_task_complete(&identity, Action::Unchanged);

        assert_eq!(progress.completed(), 2);
        progress.finish();
    }
}
