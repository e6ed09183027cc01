//! Schema resource

use catalog::{Catalog, Schema};
use declarative::{Comparison, FieldSpec, Reconcile, ResourceIdentity, Result, TaskContext, compare};

use super::{api_error, find_unique, require_id};

const KIND: &str = "schema";

const FIELDS: &[FieldSpec] = &[
    FieldSpec::ordered("shared"),
    FieldSpec::ordered("schemaType"),
    FieldSpec::ordered("contentType"),
];

pub const SCHEMA_TYPE_JSON: &str = "jsonSchema";
pub const CONTENT_TYPE_JSON: &str = "json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSettings {
    pub name: String,
    pub domain_id: String,
    pub shared: bool,
    pub schema_type: String,
    pub content_type: String,
}

impl SchemaSettings {
    /// A JSON schema in `domain_id`
    pub fn json(name: impl Into<String>, domain_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain_id: domain_id.into(),
            shared: false,
            schema_type: SCHEMA_TYPE_JSON.to_string(),
            content_type: CONTENT_TYPE_JSON.to_string(),
        }
    }
}

pub struct SchemaTask<'a> {
    catalog: &'a Catalog,
    settings: SchemaSettings,
}

impl<'a> SchemaTask<'a> {
    pub fn new(catalog: &'a Catalog, settings: SchemaSettings) -> Self {
        Self { catalog, settings }
    }

    fn desired(&self) -> Schema {
        Schema {
            id: None,
            name: self.settings.name.clone(),
            application_domain_id: self.settings.domain_id.clone(),
            shared: self.settings.shared,
            schema_type: Some(self.settings.schema_type.clone()),
            content_type: Some(self.settings.content_type.clone()),
        }
    }
}

impl Reconcile for SchemaTask<'_> {
    type Resource = Schema;

    fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(KIND, &self.settings.name).scoped(&self.settings.domain_id)
    }

    fn fetch(&self) -> Result<Option<Schema>> {
        find_unique(
            self.catalog,
            &self.identity(),
            &[
                ("name", self.settings.name.as_str()),
                ("applicationDomainId", self.settings.domain_id.as_str()),
            ],
        )
    }

    fn diff(&self, current: &Schema) -> Result<Comparison> {
        compare(current, &self.desired(), FIELDS)
    }

    fn create(&self, ctx: &mut TaskContext<'_>) -> Result<Schema> {
        self.catalog
            .create(&self.desired())
            .map_err(api_error("create schema", ctx.identity()))
    }

    fn update(&self, current: &Schema, ctx: &mut TaskContext<'_>) -> Result<Schema> {
        let id = require_id(current, "update schema", ctx.identity())?;
        self.catalog
            .update(&id, &self.desired())
            .map_err(api_error("update schema", ctx.identity()))
    }
}
