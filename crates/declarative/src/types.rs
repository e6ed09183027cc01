//! Core types for resource reconciliation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target presence of a resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// Resource must exist with the desired settings
    #[default]
    Present,
    /// Resource must not exist (declared, not reconcilable)
    Absent,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

/// Lifecycle state of a resource version
///
/// Ordered: draft < released < deprecated < retired. The catalog identifies
/// states by small stable string ids.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Draft,
    Released,
    Deprecated,
    Retired,
}

impl LifecycleState {
    /// All states in lifecycle order
    pub const ALL: [Self; 4] = [Self::Draft, Self::Released, Self::Deprecated, Self::Retired];

    /// Catalog id of this state
    pub fn id(self) -> &'static str {
        match self {
            Self::Draft => "1",
            Self::Released => "2",
            Self::Deprecated => "3",
            Self::Retired => "4",
        }
    }

    /// Look up a state by catalog id
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Released => "released",
            Self::Deprecated => "deprecated",
            Self::Retired => "retired",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for LifecycleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|state| state.name() == lowered || state.id() == lowered)
            .ok_or_else(|| format!("unknown lifecycle state '{s}'"))
    }
}

/// Identity of a resource in the catalog
///
/// `id` is `None` until the catalog assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentity {
    /// Resource kind (e.g. "event", "schema version")
    pub kind: String,
    /// Resource name, or version string for versioned kinds
    pub name: String,
    /// Owning scope id (application domain, parent resource)
    pub scope_id: Option<String>,
    /// Catalog-assigned id
    pub id: Option<String>,
}

impl ResourceIdentity {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            scope_id: None,
            id: None,
        }
    }

    pub fn scoped(mut self, scope_id: impl Into<String>) -> Self {
        self.scope_id = Some(scope_id.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)?;
        if let Some(scope) = &self.scope_id {
            write!(f, " in {scope}")?;
        }
        if let Some(id) = &self.id {
            write!(f, " [{id}]")?;
        }
        Ok(())
    }
}

/// What reconciliation did (or would do) to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Resource did not exist and was created
    Created,
    /// Resource differed and was updated (or versioned forward)
    Updated,
    /// Resource already matched the desired state
    Unchanged,
}

impl Action {
    /// Status code used in log entries
    pub fn status(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status())
    }
}

/// Summary of reconciliation results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl ReconcileSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated
    }

    /// Check if reconciliation was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.failed
    }

    /// Add an action to the summary
    pub fn add(&mut self, action: Action) {
        match action {
            Action::Created => self.created += 1,
            Action::Updated => self.updated += 1,
            Action::Unchanged => self.unchanged += 1,
        }
    }

    /// Record a failed task
    pub fn add_failure(&mut self) {
        self.failed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_ids_round_trip() {
        for state in LifecycleState::ALL {
            assert_eq!(LifecycleState::from_id(state.id()), Some(state));
        }
        assert_eq!(LifecycleState::from_id("9"), None);
    }

    #[test]
    fn test_lifecycle_order() {
        assert!(LifecycleState::Draft < LifecycleState::Released);
        assert!(LifecycleState::Released < LifecycleState::Deprecated);
        assert!(LifecycleState::Deprecated < LifecycleState::Retired);
    }

    #[test]
    fn test_lifecycle_from_str() {
        assert_eq!("Released".parse(), Ok(LifecycleState::Released));
        assert_eq!("3".parse(), Ok(LifecycleState::Deprecated));
        assert!("archived".parse::<LifecycleState>().is_err());
    }

    #[test]
    fn test_identity_display() {
        let identity = ResourceIdentity::new("event", "OrderCreated")
            .scoped("dom-1")
            .with_id("ev-7");
        assert_eq!(identity.to_string(), "event 'OrderCreated' in dom-1 [ev-7]");
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = ReconcileSummary::default();
        summary.add(Action::Created);
        summary.add(Action::Updated);
        summary.add(Action::Unchanged);
        summary.add_failure();

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.total_changes(), 2);
        assert!(!summary.is_success());
    }
}
