//! Catalog resource kinds
//!
//! One [`Reconcile`](declarative::Reconcile) implementation per kind, all
//! driven by [`declarative::reconcile`]. Non-versioned kinds (application
//! domain, event, schema, enum) are looked up by name within their domain and
//! updated in place. Versioned kinds (event, schema and enum versions) compare
//! against their latest version and never update in place: a change produces
//! a new version under a bumped version string.

use catalog::{Catalog, Record, VersionRecord};
use declarative::version;
use declarative::{BumpStrategy, Error, LifecycleState, Phase, ResourceIdentity, Result, TaskContext};

pub mod domain;
pub mod enum_version;
pub mod enumeration;
pub mod event;
pub mod event_version;
pub mod schema;
pub mod schema_version;

pub use domain::{DomainSettings, DomainTask};
pub use enum_version::{EnumVersionSettings, EnumVersionTask};
pub use enumeration::{CatalogVocabulary, EnumSettings, EnumTask};
pub use event::{EventSettings, EventTask};
pub use event_version::{EventVersionSettings, EventVersionTask};
pub use schema::{SchemaSettings, SchemaTask};
pub use schema_version::{SchemaVersionSettings, SchemaVersionTask};

/// Version-related settings shared by the versioned kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSettings {
    /// Version string of the first version
    pub initial: String,
    pub bump: BumpStrategy,
    pub target_state: LifecycleState,
    pub description: Option<String>,
    pub display_name: Option<String>,
}

impl Default for VersionSettings {
    fn default() -> Self {
        Self {
            initial: "1.0.0".to_string(),
            bump: BumpStrategy::default(),
            target_state: LifecycleState::default(),
            description: None,
            display_name: None,
        }
    }
}

impl VersionSettings {
    /// The validated first version string
    pub fn initial_version(&self) -> Result<String> {
        version::parse(&self.initial)?;
        Ok(self.initial.clone())
    }

    /// Version string following `current` under the bump strategy
    pub fn next_version<R: VersionRecord>(
        &self,
        current: &R,
        identity: &ResourceIdentity,
    ) -> Result<String> {
        let raw = current.version().ok_or_else(|| {
            Error::missing_field(format!("list {}s", identity.kind), identity, "version")
        })?;
        version::next(raw, self.bump)
    }
}

/// Wrap a catalog failure with the operation and identity it belongs to
pub(crate) fn api_error(
    operation: &str,
    identity: &ResourceIdentity,
) -> impl FnOnce(catalog::Error) -> Error + use<> {
    let operation = operation.to_string();
    let identity = identity.to_string();
    move |err| Error::CatalogApi {
        operation,
        identity,
        status: err.status(),
        message: err.to_string(),
        retryable: err.is_retryable(),
    }
}

/// Catalog-assigned id of a record, or a contract error
pub(crate) fn require_id<R: Record>(
    record: &R,
    operation: &str,
    identity: &ResourceIdentity,
) -> Result<String> {
    record
        .id()
        .map(str::to_string)
        .ok_or_else(|| Error::missing_field(operation, identity, "id"))
}

/// Look up a non-versioned resource by name (and scope)
///
/// More than one match is rejected instead of guessing.
pub(crate) fn find_unique<R: Record>(
    catalog: &Catalog,
    identity: &ResourceIdentity,
    filters: &[(&str, &str)],
) -> Result<Option<R>> {
    let mut found: Vec<R> = catalog
        .find(filters)
        .map_err(api_error(&format!("list {}", identity.kind), identity))?;

    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        count => Err(Error::AmbiguousResource {
            kind: identity.kind.clone(),
            name: identity.name.clone(),
            scope: identity.scope_id.clone(),
            count,
        }),
    }
}

/// Latest version of a versioned resource by semver precedence
pub(crate) fn latest_version<R: VersionRecord>(
    catalog: &Catalog,
    parent_id: &str,
    identity: &ResourceIdentity,
) -> Result<Option<R>> {
    let versions: Vec<R> = catalog
        .versions(parent_id)
        .map_err(api_error(&format!("list {}s", identity.kind), identity))?;
    log::trace!("{identity}: {} existing versions", versions.len());
    Ok(version::latest_by(versions, |v| v.version()))
}

/// Create a version, then move it to the target lifecycle state
///
/// The transition is attempted once, only when the created version's state
/// differs from the target. The state-change call returns nothing, so the
/// version is fetched again afterwards.
pub(crate) fn create_version<R: VersionRecord>(
    catalog: &Catalog,
    record: &R,
    target: LifecycleState,
    ctx: &mut TaskContext<'_>,
) -> Result<R> {
    let identity = ctx.identity().clone();
    let operation = format!("create {}", identity.kind);

    let created = catalog
        .create(record)
        .map_err(api_error(&operation, &identity))?;
    let id = require_id(&created, &operation, &identity)?;
    let state_id = created
        .state_id()
        .ok_or_else(|| Error::missing_field(&operation, &identity, "stateId"))?;

    if state_id == target.id() {
        return Ok(created);
    }

    ctx.phase(Phase::StateTransitioning);
    log::info!(
        "{identity}: moving version {} to {target}",
        created.version().unwrap_or_default()
    );
    catalog
        .change_state::<R>(&id, target.id())
        .map_err(api_error(&format!("change {} state", identity.kind), &identity))?;

    catalog
        .get(&id)
        .map_err(api_error(&format!("get {}", identity.kind), &identity))
}
