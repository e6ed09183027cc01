//! Schema version resource
//!
//! The catalog stores schema content as text. Content is compared as parsed
//! JSON, so formatting and key order do not produce new versions.

use catalog::{Catalog, SchemaVersion};
use declarative::{
    Comparison, Error, FieldSpec, Reconcile, ResourceIdentity, Result, TaskContext, compare_values,
};
use serde_json::Value;

use super::{VersionSettings, create_version, latest_version};

const KIND: &str = "schema version";

const FIELDS: &[FieldSpec] = &[
    FieldSpec::ordered("description"),
    FieldSpec::ordered("displayName"),
    FieldSpec::ordered("stateId"),
    FieldSpec::ordered("content"),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaVersionSettings {
    pub schema_id: String,
    pub schema_name: String,
    pub version: VersionSettings,
    /// Schema body
    pub content: Value,
}

pub struct SchemaVersionTask<'a> {
    catalog: &'a Catalog,
    settings: SchemaVersionSettings,
}

impl<'a> SchemaVersionTask<'a> {
    pub fn new(catalog: &'a Catalog, settings: SchemaVersionSettings) -> Self {
        Self { catalog, settings }
    }

    fn desired(&self, version: Option<String>) -> Result<SchemaVersion> {
        let settings = &self.settings.version;
        let content = serde_json::to_string(&self.settings.content)
            .map_err(|e| Error::serialization("schema content", e))?;
        Ok(SchemaVersion {
            id: None,
            schema_id: self.settings.schema_id.clone(),
            version,
            description: settings.description.clone(),
            display_name: settings.display_name.clone(),
            state_id: Some(settings.target_state.id().to_string()),
            content: Some(content),
        })
    }
}

/// JSON form of a version with its content parsed
///
/// Content that is not valid JSON is compared as text.
fn comparable(version: &SchemaVersion) -> Result<Value> {
    let mut value =
        serde_json::to_value(version).map_err(|e| Error::serialization("schema version", e))?;
    if let Some(content) = version.content.as_deref()
        && let Ok(parsed) = serde_json::from_str::<Value>(content)
    {
        value["content"] = parsed;
    }
    Ok(value)
}

impl Reconcile for SchemaVersionTask<'_> {
    type Resource = SchemaVersion;

    fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(KIND, &self.settings.schema_name).scoped(&self.settings.schema_id)
    }

    fn fetch(&self) -> Result<Option<SchemaVersion>> {
        latest_version(self.catalog, &self.settings.schema_id, &self.identity())
    }

    fn diff(&self, current: &SchemaVersion) -> Result<Comparison> {
        Ok(compare_values(
            &comparable(current)?,
            &comparable(&self.desired(None)?)?,
            FIELDS,
        ))
    }

    fn create(&self, ctx: &mut TaskContext<'_>) -> Result<SchemaVersion> {
        let record = self.desired(Some(self.settings.version.initial_version()?))?;
        create_version(
            self.catalog,
            &record,
            self.settings.version.target_state,
            ctx,
        )
    }

    fn update(&self, current: &SchemaVersion, ctx: &mut TaskContext<'_>) -> Result<SchemaVersion> {
        let next = self.settings.version.next_version(current, ctx.identity())?;
        let record = self.desired(Some(next))?;
        create_version(
            self.catalog,
            &record,
            self.settings.version.target_state,
            ctx,
        )
    }
}
