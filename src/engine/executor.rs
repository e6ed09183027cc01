//! Sync executor - run reconciliation tasks in dependency order
//!
//! Domain first, then enums, schemas and events, each followed by its
//! version. Ids resolved by earlier tasks feed later ones: enum version ids
//! bind topic variables, schema version ids are referenced by event
//! versions. A failed task does not stop the run; tasks depending on it are
//! skipped and reported.

use catalog::{Catalog, Record};
use declarative::{
    Action, Decision, Difference, ErrorCategory, LogCallback, ProgressCallback, Reconcile, ReconcileSummary,
    ResourceIdentity, RetryConfig, preview, reconcile, with_retry,
};
use std::collections::HashMap;
use std::fmt;

use super::planner::SyncPlan;
use crate::address::{decompose, render};
use crate::resource::{
    CatalogVocabulary, DomainSettings, DomainTask, EnumSettings, EnumTask, EnumVersionSettings,
    EnumVersionTask, EventSettings, EventTask, EventVersionSettings, EventVersionTask,
    SchemaSettings, SchemaTask, SchemaVersionSettings, SchemaVersionTask,
};

/// Placeholder id for resources a dry run would create
pub const PENDING_ID: &str = "(pending)";

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Fetch and decide only
    pub dry_run: bool,
    /// Retry policy around each task
    pub retry: RetryConfig,
}

/// What happened to one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Created,
    Updated,
    Unchanged,
    WouldCreate,
    WouldUpdate,
    Skipped(String),
    Failed(String),
}

impl Status {
    fn from_action(action: Action) -> Self {
        match action {
            Action::Created => Self::Created,
            Action::Updated => Self::Updated,
            Action::Unchanged => Self::Unchanged,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Skipped(_) | Self::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::WouldCreate => "would create",
            Self::WouldUpdate => "would update",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped(reason) | Self::Failed(reason) => write!(f, "{}: {reason}", self.label()),
            _ => write!(f, "{}", self.label()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub identity: ResourceIdentity,
    pub status: Status,
    /// Difference behind an update
    pub difference: Option<Difference>,
    /// Category of the error behind a failure
    pub category: Option<ErrorCategory>,
}

/// Result of a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub outcomes: Vec<Outcome>,
    /// Counts; in a dry run, what would happen
    pub summary: ReconcileSummary,
    pub dry_run: bool,
}

impl SyncReport {
    fn record(&mut self, outcome: Outcome) {
        match &outcome.status {
            Status::Created | Status::WouldCreate => self.summary.add(Action::Created),
            Status::Updated | Status::WouldUpdate => self.summary.add(Action::Updated),
            Status::Unchanged => self.summary.add(Action::Unchanged),
            Status::Skipped(_) | Status::Failed(_) => self.summary.add_failure(),
        }
        self.outcomes.push(outcome);
    }

    pub fn is_success(&self) -> bool {
        self.summary.is_success()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| o.status.is_failure())
    }
}

/// How a resource other tasks depend on was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
enum Parent {
    Existing(String),
    /// A dry run would create it
    Pending,
    Failed,
}

impl Parent {
    fn id(&self) -> &str {
        match self {
            Self::Existing(id) => id,
            Self::Pending | Self::Failed => PENDING_ID,
        }
    }
}

pub struct Executor<'a> {
    catalog: &'a Catalog,
    options: SyncOptions,
    progress: &'a mut dyn ProgressCallback,
    report: SyncReport,
}

impl<'a> Executor<'a> {
    pub fn new(
        catalog: &'a Catalog,
        options: SyncOptions,
        progress: &'a mut dyn ProgressCallback,
    ) -> Self {
        let report = SyncReport {
            dry_run: options.dry_run,
            ..Default::default()
        };
        Self {
            catalog,
            options,
            progress,
            report,
        }
    }

    /// Run every task of the plan
    pub fn execute(mut self, plan: &SyncPlan) -> SyncReport {
        let catalog = self.catalog;

        let domain = self.run(&DomainTask::new(
            catalog,
            DomainSettings {
                name: plan.domain.name.clone(),
                description: plan.domain.description.clone(),
                ..Default::default()
            },
        ));

        let mut vocabulary = CatalogVocabulary::new(catalog);
        for planned in &plan.enums {
            let enumeration = self.run_child(
                &domain,
                &EnumTask::new(
                    catalog,
                    EnumSettings {
                        name: planned.name.clone(),
                        domain_id: domain.id().to_string(),
                        shared: false,
                    },
                ),
            );
            let version = self.run_child(
                &enumeration,
                &EnumVersionTask::new(
                    catalog,
                    EnumVersionSettings {
                        enum_id: enumeration.id().to_string(),
                        enum_name: planned.name.clone(),
                        version: plan.version_settings(planned.description.as_deref(), None),
                        values: planned.values.clone(),
                    },
                ),
            );
            if version != Parent::Failed {
                vocabulary.bind(&planned.name, version.id());
            }
        }

        let mut schema_versions: HashMap<&str, Parent> = HashMap::new();
        for planned in &plan.schemas {
            let schema = self.run_child(
                &domain,
                &SchemaTask::new(
                    catalog,
                    SchemaSettings::json(&planned.name, domain.id()),
                ),
            );
            let version = self.run_child(
                &schema,
                &SchemaVersionTask::new(
                    catalog,
                    SchemaVersionSettings {
                        schema_id: schema.id().to_string(),
                        schema_name: planned.name.clone(),
                        version: plan.version_settings(
                            planned.description.as_deref(),
                            planned.display_name.as_deref(),
                        ),
                        content: planned.content.clone(),
                    },
                ),
            );
            schema_versions.insert(&planned.name, version);
        }

        for planned in &plan.events {
            let event = self.run_child(
                &domain,
                &EventTask::new(
                    catalog,
                    EventSettings {
                        name: planned.name.clone(),
                        domain_id: domain.id().to_string(),
                        shared: plan.options.shared_events,
                    },
                ),
            );

            let schema_version = planned
                .schema
                .as_deref()
                .and_then(|name| schema_versions.get(name));

            let mut settings = EventVersionSettings {
                event_id: event.id().to_string(),
                event_name: planned.name.clone(),
                version: plan.version_settings(
                    planned.description.as_deref(),
                    planned.display_name.as_deref(),
                ),
                schema_version_id: schema_version.map(|v| v.id().to_string()),
                broker_type: plan.options.broker_type.clone(),
                address: None,
            };

            if matches!(schema_version, Some(Parent::Failed)) {
                let task = EventVersionTask::new(catalog, settings);
                self.skip(task.identity(), "schema version failed");
                continue;
            }

            if let (Parent::Existing(_), Some(topic)) = (&event, &planned.topic) {
                match decompose(topic, domain.id(), &vocabulary) {
                    Ok(segments) => {
                        log::debug!("{}: address {}", planned.name, render(&segments));
                        settings.address = Some(segments);
                    }
                    Err(e) => {
                        let task = EventVersionTask::new(catalog, settings);
                        self.fail(task.identity(), &e);
                        continue;
                    }
                }
            }

            self.run_child(&event, &EventVersionTask::new(catalog, settings));
        }

        self.report
    }

    /// Run a task whose scope is `parent`
    fn run_child<T>(&mut self, parent: &Parent, task: &T) -> Parent
    where
        T: Reconcile,
        T::Resource: Record,
    {
        match parent {
            Parent::Existing(_) => self.run(task),
            Parent::Pending => {
                self.report.record(Outcome {
                    identity: task.identity(),
                    status: Status::WouldCreate,
                    difference: None,
                    category: None,
                });
                Parent::Pending
            }
            Parent::Failed => {
                self.skip(task.identity(), "parent failed");
                Parent::Failed
            }
        }
    }

    fn run<T>(&mut self, task: &T) -> Parent
    where
        T: Reconcile,
        T::Resource: Record,
    {
        if self.options.dry_run {
            self.preview(task)
        } else {
            self.apply(task)
        }
    }

    fn apply<T>(&mut self, task: &T) -> Parent
    where
        T: Reconcile,
        T::Resource: Record,
    {
        let progress = &mut *self.progress;
        let result = with_retry(&self.options.retry, Some(&LogCallback), || {
            reconcile(task, &mut *progress)
        });

        match result {
            Ok(reconciled) => {
                let identity = match reconciled.resource.id() {
                    Some(id) => task.identity().with_id(id),
                    None => task.identity(),
                };
                let parent = identity
                    .id
                    .clone()
                    .map_or(Parent::Failed, Parent::Existing);
                self.report.record(Outcome {
                    identity,
                    status: Status::from_action(reconciled.action),
                    difference: reconciled.difference,
                    category: None,
                });
                parent
            }
            Err(e) => {
                self.fail(task.identity(), &e);
                Parent::Failed
            }
        }
    }

    fn preview<T>(&mut self, task: &T) -> Parent
    where
        T: Reconcile,
        T::Resource: Record,
    {
        let progress = &mut *self.progress;
        let result = with_retry(&self.options.retry, Some(&LogCallback), || {
            preview(task, &mut *progress)
        });

        let decision = match result {
            Ok(decision) => decision,
            Err(e) => {
                self.fail(task.identity(), &e);
                return Parent::Failed;
            }
        };

        let existing = decision.current().and_then(Record::id).map(str::to_string);
        let identity = match &existing {
            Some(id) => task.identity().with_id(id),
            None => task.identity(),
        };

        let (status, difference, parent) = match decision {
            Decision::Create => (Status::WouldCreate, None, Parent::Pending),
            // A versioned resource moves to a new version with a new id
            Decision::Update { difference, .. } if T::Resource::COLLECTION.is_versioned() => {
                (Status::WouldUpdate, Some(difference), Parent::Pending)
            }
            Decision::Update { difference, .. } => (
                Status::WouldUpdate,
                Some(difference),
                existing.map_or(Parent::Pending, Parent::Existing),
            ),
            Decision::Unchanged(_) => (
                Status::Unchanged,
                None,
                existing.map_or(Parent::Pending, Parent::Existing),
            ),
        };
        log::info!("{identity}: {}", status.label());

        self.report.record(Outcome {
            identity,
            status,
            difference,
            category: None,
        });
        parent
    }

    fn skip(&mut self, identity: ResourceIdentity, reason: &str) {
        log::warn!("{identity}: skipped ({reason})");
        self.report.record(Outcome {
            identity,
            status: Status::Skipped(reason.to_string()),
            difference: None,
            category: None,
        });
    }

    fn fail(&mut self, identity: ResourceIdentity, error: &declarative::Error) {
        log::error!("{identity}: {error}");
        self.report.record(Outcome {
            identity,
            status: Status::Failed(error.to_string()),
            difference: None,
            category: Some(error.category()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::sample;
    use crate::engine::planner::PlanOptions;
    use catalog::backend::CatalogClient;
    use catalog::{Collection, MemoryCatalog};
    use declarative::{LifecycleState, NoProgress};
    use serde_json::{Value, json};

    fn plan() -> SyncPlan {
        let options = PlanOptions {
            target_state: LifecycleState::Released,
            ..Default::default()
        };
        SyncPlan::from_document(&sample(), options).unwrap()
    }

    fn options(dry_run: bool) -> SyncOptions {
        SyncOptions {
            dry_run,
            retry: RetryConfig::no_retry(),
        }
    }

    fn sync(catalog: &Catalog, plan: &SyncPlan, dry_run: bool) -> SyncReport {
        let mut progress = NoProgress;
        Executor::new(catalog, options(dry_run), &mut progress).execute(plan)
    }

    fn status_of<'r>(report: &'r SyncReport, kind: &str, name: &str) -> &'r Status {
        &report
            .outcomes
            .iter()
            .find(|o| o.identity.kind == kind && o.identity.name == name)
            .unwrap()
            .status
    }

    /// Rejects creates in one collection
    struct RejectCreates {
        inner: MemoryCatalog,
        collection: Collection,
    }

    impl CatalogClient for RejectCreates {
        fn list(&self, collection: Collection, filters: &[(&str, &str)]) -> catalog::Result<Vec<Value>> {
            self.inner.list(collection, filters)
        }

        fn get(&self, collection: Collection, id: &str) -> catalog::Result<Value> {
            self.inner.get(collection, id)
        }

        fn create(&self, collection: Collection, body: &Value) -> catalog::Result<Value> {
            if collection == self.collection {
                return Err(catalog::Error::http(422, "rejected"));
            }
            self.inner.create(collection, body)
        }

        fn update(&self, collection: Collection, id: &str, body: &Value) -> catalog::Result<Value> {
            self.inner.update(collection, id, body)
        }

        fn change_state(&self, collection: Collection, id: &str, state_id: &str) -> catalog::Result<()> {
            self.inner.change_state(collection, id, state_id)
        }
    }

    #[test]
    fn test_full_sync_creates_everything() {
        let memory = MemoryCatalog::new();
        let catalog = Catalog::with_backend(Box::new(memory.clone()));
        let report = sync(&catalog, &plan(), false);

        assert!(report.is_success());
        assert_eq!(report.summary.created, 11);
        assert_eq!(memory.records(Collection::EventVersions).len(), 2);

        let enum_version_id = memory.records(Collection::EnumVersions)[0]["id"].clone();
        let created = memory
            .records(Collection::EventVersions)
            .into_iter()
            .find(|v| {
                v["deliveryDescriptor"]["address"]["addressLevels"][0]["name"] == "orders"
                    && v["deliveryDescriptor"]["address"]["addressLevels"]
                        .as_array()
                        .is_some_and(|levels| levels.len() == 3)
            })
            .unwrap();
        let levels = &created["deliveryDescriptor"]["address"]["addressLevels"];
        assert_eq!(levels[1]["enumVersionId"], enum_version_id);
        assert_eq!(created["stateId"], LifecycleState::Released.id());
        assert!(created["schemaVersionId"].is_string());
    }

    #[test]
    fn test_second_sync_is_a_no_op() {
        let memory = MemoryCatalog::new();
        let catalog = Catalog::with_backend(Box::new(memory.clone()));
        let plan = plan();
        sync(&catalog, &plan, false);
        let calls = memory.mutation_count();

        let report = sync(&catalog, &plan, false);
        assert_eq!(report.summary.unchanged, 11);
        assert_eq!(report.summary.total_changes(), 0);
        assert_eq!(memory.mutation_count(), calls);
    }

    #[test]
    fn test_dry_run_never_mutates() {
        let memory = MemoryCatalog::new();
        let catalog = Catalog::with_backend(Box::new(memory.clone()));
        let report = sync(&catalog, &plan(), true);

        assert!(report.dry_run);
        assert_eq!(memory.mutation_count(), 0);
        assert!(
            report
                .outcomes
                .iter()
                .all(|o| o.status == Status::WouldCreate)
        );
        assert_eq!(report.outcomes.len(), 11);
    }

    #[test]
    fn test_dry_run_reports_payload_change() {
        let memory = MemoryCatalog::new();
        let catalog = Catalog::with_backend(Box::new(memory.clone()));
        sync(&catalog, &plan(), false);
        let calls = memory.mutation_count();

        let mut changed = plan();
        for schema in &mut changed.schemas {
            if schema.name == "OrderCancelled" {
                schema.content = json!({"type": "object", "required": ["reason"]});
            }
        }
        let report = sync(&catalog, &changed, true);

        assert_eq!(memory.mutation_count(), calls);
        assert_eq!(
            status_of(&report, "schema version", "OrderCancelled"),
            &Status::WouldUpdate
        );
        // Its event version would point at the new schema version
        assert_eq!(
            status_of(&report, "event version", "OrderCancelled"),
            &Status::WouldUpdate
        );
        assert_eq!(
            status_of(&report, "event version", "OrderCreated"),
            &Status::Unchanged
        );
    }

    #[test]
    fn test_failed_schema_skips_dependent_event_version() {
        let memory = MemoryCatalog::new();
        let catalog = Catalog::with_backend(Box::new(RejectCreates {
            inner: memory.clone(),
            collection: Collection::SchemaVersions,
        }));
        let report = sync(&catalog, &plan(), false);

        assert!(!report.is_success());
        assert!(matches!(
            status_of(&report, "schema version", "OrderCreated"),
            Status::Failed(message) if message.contains("422")
        ));
        assert!(matches!(
            status_of(&report, "event version", "OrderCreated"),
            Status::Skipped(_)
        ));
        // Events themselves do not depend on schemas
        assert_eq!(status_of(&report, "event", "OrderCreated"), &Status::Created);
        assert_eq!(report.failures().count(), 4);

        let categories: Vec<_> = report.failures().map(|o| o.category).collect();
        assert!(categories.contains(&Some(ErrorCategory::Remote)));
        assert!(categories.contains(&None));
    }

    #[test]
    fn test_failed_domain_skips_everything() {
        let memory = MemoryCatalog::new();
        let catalog = Catalog::with_backend(Box::new(RejectCreates {
            inner: memory.clone(),
            collection: Collection::ApplicationDomains,
        }));
        let report = sync(&catalog, &plan(), false);

        assert_eq!(report.summary.failed, 11);
        assert_eq!(memory.mutation_count(), 0);
        assert_eq!(report.failures().filter(|o| matches!(o.status, Status::Skipped(_))).count(), 10);
    }
}
