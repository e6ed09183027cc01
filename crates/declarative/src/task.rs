//! Reconciliation tasks and the generic driver
//!
//! A resource kind implements [`Reconcile`] (fetch, diff, create, update) and
//! [`reconcile`] drives it through the state machine:
//!
//! ```text
//! FETCHING → DECIDING → { CREATING | UPDATING | NOOP } → (STATE_TRANSITIONING) → DONE
//! ```
//!
//! Any error aborts the task and propagates. Nothing is rolled back: a
//! resource created before a later step failed stays in the catalog, and the
//! next run picks it up as existing.
//!
//! ## Example
//!
//! ```
//! use declarative::{
//!     Comparison, FieldSpec, NoProgress, Reconcile, ResourceIdentity, Result, TaskContext,
//!     compare, reconcile, Action,
//! };
//! use serde_json::{json, Value};
//!
//! struct Tag { desired: Value }
//!
//! impl Reconcile for Tag {
//!     type Resource = Value;
//!
//!     fn identity(&self) -> ResourceIdentity {
//!         ResourceIdentity::new("tag", "release")
//!     }
//!     fn fetch(&self) -> Result<Option<Value>> {
//!         Ok(None)
//!     }
//!     fn diff(&self, current: &Value) -> Result<Comparison> {
//!         compare(current, &self.desired, &[FieldSpec::ordered("color")])
//!     }
//!     fn create(&self, _ctx: &mut TaskContext<'_>) -> Result<Value> {
//!         Ok(self.desired.clone())
//!     }
//!     fn update(&self, _current: &Value, _ctx: &mut TaskContext<'_>) -> Result<Value> {
//!         Ok(self.desired.clone())
//!     }
//! }
//!
//! let task = Tag { desired: json!({"color": "green"}) };
//! let outcome = reconcile(&task, &mut NoProgress).unwrap();
//! assert_eq!(outcome.action, Action::Created);
//! ```

use crate::context::{Phase, ProgressCallback, TaskContext};
use crate::diff::{Comparison, Difference};
use crate::error::{Error, Result};
use crate::types::{Action, Presence, ResourceIdentity};

/// Capability set of one resource kind
///
/// Implementations hold their desired settings and a catalog client; they are
/// never mutated while reconciling.
pub trait Reconcile {
    /// The catalog record this kind reconciles
    type Resource;

    /// Identity of the resource (kind, name, scope)
    fn identity(&self) -> ResourceIdentity;

    /// Target presence
    fn target(&self) -> Presence {
        Presence::Present
    }

    /// Look up the current resource
    ///
    /// Versioned kinds return their latest version; `None` means the resource
    /// does not exist yet.
    fn fetch(&self) -> Result<Option<Self::Resource>>;

    /// Compare the current resource against the desired settings
    fn diff(&self, current: &Self::Resource) -> Result<Comparison>;

    /// Create the resource from the desired settings
    fn create(&self, ctx: &mut TaskContext<'_>) -> Result<Self::Resource>;

    /// Bring an existing resource to the desired settings
    fn update(&self, current: &Self::Resource, ctx: &mut TaskContext<'_>)
    -> Result<Self::Resource>;
}

/// Result of a successful reconciliation
#[derive(Debug, Clone)]
pub struct Reconciled<T> {
    pub action: Action,
    pub resource: T,
    /// Difference that triggered an update
    pub difference: Option<Difference>,
}

/// What reconciliation would do, without doing it
#[derive(Debug, Clone)]
pub enum Decision<T> {
    Create,
    Update { current: T, difference: Difference },
    Unchanged(T),
}

impl<T> Decision<T> {
    pub fn action(&self) -> Action {
        match self {
            Self::Create => Action::Created,
            Self::Update { .. } => Action::Updated,
            Self::Unchanged(_) => Action::Unchanged,
        }
    }

    /// The existing resource, if any
    pub fn current(&self) -> Option<&T> {
        match self {
            Self::Create => None,
            Self::Update { current, .. } | Self::Unchanged(current) => Some(current),
        }
    }
}

/// Drive a task through the reconciliation state machine
pub fn reconcile<R>(task: &R, progress: &mut dyn ProgressCallback) -> Result<Reconciled<R::Resource>>
where
    R: Reconcile + ?Sized,
{
    let identity = task.identity();
    progress.on_task_start(&identity);

    let decision = decide(task, &identity, progress)?;

    let mut ctx = TaskContext::new(&identity, progress);
    let outcome = match decision {
        Decision::Create => {
            ctx.phase(Phase::Creating);
            Reconciled {
                action: Action::Created,
                resource: task.create(&mut ctx)?,
                difference: None,
            }
        }
        Decision::Update {
            current,
            difference,
        } => {
            ctx.phase(Phase::Updating);
            log::debug!("{identity} differs: {difference}");
            Reconciled {
                action: Action::Updated,
                resource: task.update(&current, &mut ctx)?,
                difference: Some(difference),
            }
        }
        Decision::Unchanged(current) => {
            ctx.phase(Phase::Noop);
            Reconciled {
                action: Action::Unchanged,
                resource: current,
                difference: None,
            }
        }
    };
    ctx.phase(Phase::Done);

    log::info!("{identity}: {}", outcome.action.status());
    progress.on_task_complete(&identity, outcome.action);
    Ok(outcome)
}

/// Fetch and decide only; never mutates the catalog
pub fn preview<R>(task: &R, progress: &mut dyn ProgressCallback) -> Result<Decision<R::Resource>>
where
    R: Reconcile + ?Sized,
{
    let identity = task.identity();
    decide(task, &identity, progress)
}

fn decide<R>(
    task: &R,
    identity: &ResourceIdentity,
    progress: &mut dyn ProgressCallback,
) -> Result<Decision<R::Resource>>
where
    R: Reconcile + ?Sized,
{
    if task.target() == Presence::Absent {
        return Err(Error::Unsupported {
            identity: identity.to_string(),
            target: Presence::Absent.to_string(),
        });
    }

    let mut ctx = TaskContext::new(identity, progress);
    ctx.phase(Phase::Fetching);
    let current = task.fetch()?;

    ctx.phase(Phase::Deciding);
    let Some(current) = current else {
        return Ok(Decision::Create);
    };

    let comparison = task.diff(&current)?;
    if comparison.is_equal {
        Ok(Decision::Unchanged(current))
    } else {
        Ok(Decision::Update {
            current,
            difference: comparison.difference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoProgress;
    use crate::diff::{FieldSpec, compare};
    use serde_json::{Value, json};
    use std::cell::Cell;

    const FIELDS: &[FieldSpec] = &[FieldSpec::ordered("description")];

    struct FakeTask {
        existing: Option<Value>,
        desired: Value,
        target: Presence,
        creates: Cell<usize>,
        updates: Cell<usize>,
    }

    impl FakeTask {
        fn new(existing: Option<Value>, desired: Value) -> Self {
            Self {
                existing,
                desired,
                target: Presence::Present,
                creates: Cell::new(0),
                updates: Cell::new(0),
            }
        }
    }

    impl Reconcile for FakeTask {
        type Resource = Value;

        fn identity(&self) -> ResourceIdentity {
            ResourceIdentity::new("fake", "one")
        }

        fn target(&self) -> Presence {
            self.target
        }

        fn fetch(&self) -> Result<Option<Value>> {
            Ok(self.existing.clone())
        }

        fn diff(&self, current: &Value) -> Result<Comparison> {
            compare(current, &self.desired, FIELDS)
        }

        fn create(&self, _ctx: &mut TaskContext<'_>) -> Result<Value> {
            self.creates.set(self.creates.get() + 1);
            Ok(self.desired.clone())
        }

        fn update(&self, _current: &Value, ctx: &mut TaskContext<'_>) -> Result<Value> {
            ctx.phase(Phase::StateTransitioning);
            self.updates.set(self.updates.get() + 1);
            Ok(self.desired.clone())
        }
    }

    #[derive(Default)]
    struct Recorder {
        phases: Vec<Phase>,
        completed: Vec<Action>,
    }

    impl ProgressCallback for Recorder {
        fn on_task_start(&mut self, _identity: &ResourceIdentity) {}
        fn on_phase(&mut self, _identity: &ResourceIdentity, phase: Phase) {
            self.phases.push(phase);
        }
        fn on_task_complete(&mut self, _identity: &ResourceIdentity, action: Action) {
            self.completed.push(action);
        }
    }

    #[test]
    fn test_missing_resource_is_created_once() {
        let task = FakeTask::new(None, json!({"description": "new"}));
        let outcome = reconcile(&task, &mut NoProgress).unwrap();

        assert_eq!(outcome.action, Action::Created);
        assert_eq!(task.creates.get(), 1);
        assert_eq!(task.updates.get(), 0);
    }

    #[test]
    fn test_matching_resource_is_unchanged() {
        let existing = json!({"id": "x-1", "description": "same"});
        let task = FakeTask::new(Some(existing.clone()), json!({"description": "same"}));
        let outcome = reconcile(&task, &mut NoProgress).unwrap();

        assert_eq!(outcome.action, Action::Unchanged);
        assert_eq!(outcome.resource, existing);
        assert_eq!(task.creates.get() + task.updates.get(), 0);
    }

    #[test]
    fn test_differing_resource_is_updated() {
        let task = FakeTask::new(
            Some(json!({"description": "old"})),
            json!({"description": "new"}),
        );
        let outcome = reconcile(&task, &mut NoProgress).unwrap();

        assert_eq!(outcome.action, Action::Updated);
        assert!(outcome.difference.unwrap().names("description"));
        assert_eq!(task.updates.get(), 1);
    }

    #[test]
    fn test_absent_target_is_unsupported() {
        let mut task = FakeTask::new(None, json!({}));
        task.target = Presence::Absent;

        let err = reconcile(&task, &mut NoProgress).unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
        assert_eq!(task.creates.get(), 0);
    }

    #[test]
    fn test_phase_sequence_for_update() {
        let task = FakeTask::new(
            Some(json!({"description": "old"})),
            json!({"description": "new"}),
        );
        let mut recorder = Recorder::default();
        reconcile(&task, &mut recorder).unwrap();

        assert_eq!(
            recorder.phases,
            vec![
                Phase::Fetching,
                Phase::Deciding,
                Phase::Updating,
                Phase::StateTransitioning,
                Phase::Done
            ]
        );
        assert_eq!(recorder.completed, vec![Action::Updated]);
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let task = FakeTask::new(
            Some(json!({"description": "old"})),
            json!({"description": "new"}),
        );
        let decision = preview(&task, &mut NoProgress).unwrap();

        assert_eq!(decision.action(), Action::Updated);
        assert!(decision.current().is_some());
        assert_eq!(task.creates.get() + task.updates.get(), 0);

        let missing = FakeTask::new(None, json!({}));
        assert!(matches!(
            preview(&missing, &mut NoProgress).unwrap(),
            Decision::Create
        ));
    }
}
