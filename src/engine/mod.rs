//! Sync engine for catalog-sync
//!
//! The engine orchestrates:
//! 1. Planning - Derive desired resources from a document
//! 2. Executing - Reconcile them in dependency order, or preview them

pub mod executor;
pub mod planner;

pub use executor::{Executor, Status, SyncOptions, SyncReport};
pub use planner::{PlanOptions, SyncPlan};
