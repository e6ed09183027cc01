//! # Declarative
//!
//! Idempotent reconciliation of remote catalog resources.
//!
//! This crate provides the pieces needed to converge a remote resource onto a
//! desired description: a semantic version model, a structural diff over a
//! chosen field subset, and a generic state-machine driver that fetches,
//! decides and then creates, updates or leaves a resource alone.
//!
//! ## Core Concepts
//!
//! - **Reconcile**: Capability set of one resource kind (fetch, diff, create, update)
//! - **Comparison**: Result of a structural diff restricted to compared fields
//! - **Version**: Semantic version with precedence ordering and bump rules
//! - **Retry**: Caller-side backoff for transient catalog failures
//!
//! See [`task`] for a complete example.
//!
//! ## Provider Traits
//!
//! - [`ProgressCallback`]: Receives state-machine transitions
//! - [`ConfirmCallback`]: Handles user confirmations
//! - [`RetryCallback`]: Observes retries
//!
//! None of them depend on a terminal UI.

pub mod context;
pub mod diff;
pub mod error;
pub mod retry;
pub mod task;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use context::{
    AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, Phase, ProgressCallback,
    TaskContext,
};
pub use diff::{
    ChangeKind, Comparison, Difference, FieldChange, FieldSpec, Order, compare, compare_values,
};
pub use error::{Error, ErrorCategory, Result};
pub use retry::{LogCallback, RetryCallback, RetryConfig, with_retry};
pub use task::{Decision, Reconcile, Reconciled, preview, reconcile};
pub use types::{Action, LifecycleState, Presence, ReconcileSummary, ResourceIdentity};
pub use version::{BumpStrategy, Version};
