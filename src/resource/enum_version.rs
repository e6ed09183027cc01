//! Enumeration version resource

use catalog::{Catalog, EnumValue, EnumVersion};
use declarative::{Comparison, FieldSpec, Reconcile, ResourceIdentity, Result, TaskContext, compare};

use super::{VersionSettings, create_version, latest_version};

const KIND: &str = "enum version";

// Values are a set: reordering them is not a change
const FIELDS: &[FieldSpec] = &[
    FieldSpec::ordered("description"),
    FieldSpec::ordered("displayName"),
    FieldSpec::ordered("stateId"),
    FieldSpec::unordered("values"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumVersionSettings {
    pub enum_id: String,
    pub enum_name: String,
    pub version: VersionSettings,
    pub values: Vec<String>,
}

pub struct EnumVersionTask<'a> {
    catalog: &'a Catalog,
    settings: EnumVersionSettings,
}

impl<'a> EnumVersionTask<'a> {
    pub fn new(catalog: &'a Catalog, settings: EnumVersionSettings) -> Self {
        Self { catalog, settings }
    }

    fn desired(&self, version: Option<String>) -> EnumVersion {
        let settings = &self.settings.version;
        EnumVersion {
            id: None,
            enum_id: self.settings.enum_id.clone(),
            version,
            description: settings.description.clone(),
            display_name: settings.display_name.clone(),
            state_id: Some(settings.target_state.id().to_string()),
            values: self.settings.values.iter().map(EnumValue::new).collect(),
        }
    }
}

impl Reconcile for EnumVersionTask<'_> {
    type Resource = EnumVersion;

    fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(KIND, &self.settings.enum_name).scoped(&self.settings.enum_id)
    }

    fn fetch(&self) -> Result<Option<EnumVersion>> {
        latest_version(self.catalog, &self.settings.enum_id, &self.identity())
    }

    fn diff(&self, current: &EnumVersion) -> Result<Comparison> {
        compare(current, &self.desired(None), FIELDS)
    }

    fn create(&self, ctx: &mut TaskContext<'_>) -> Result<EnumVersion> {
        let record = self.desired(Some(self.settings.version.initial_version()?));
        create_version(
            self.catalog,
            &record,
            self.settings.version.target_state,
            ctx,
        )
    }

    fn update(&self, current: &EnumVersion, ctx: &mut TaskContext<'_>) -> Result<EnumVersion> {
        let next = self.settings.version.next_version(current, ctx.identity())?;
        let record = self.desired(Some(next));
        create_version(
            self.catalog,
            &record,
            self.settings.version.target_state,
            ctx,
        )
    }
}
