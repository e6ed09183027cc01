//! Enumeration resource and the catalog-backed topic vocabulary

use crate::address::VocabularyResolver;
use catalog::{Catalog, EnumVersion, Enumeration};
use declarative::{Comparison, FieldSpec, Reconcile, ResourceIdentity, Result, TaskContext, compare};
use std::collections::HashMap;

use super::{api_error, find_unique, latest_version, require_id};

const KIND: &str = "enum";

const FIELDS: &[FieldSpec] = &[FieldSpec::ordered("shared")];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumSettings {
    pub name: String,
    pub domain_id: String,
    pub shared: bool,
}

pub struct EnumTask<'a> {
    catalog: &'a Catalog,
    settings: EnumSettings,
}

impl<'a> EnumTask<'a> {
    pub fn new(catalog: &'a Catalog, settings: EnumSettings) -> Self {
        Self { catalog, settings }
    }

    fn desired(&self) -> Enumeration {
        Enumeration {
            id: None,
            name: self.settings.name.clone(),
            application_domain_id: self.settings.domain_id.clone(),
            shared: self.settings.shared,
        }
    }
}

impl Reconcile for EnumTask<'_> {
    type Resource = Enumeration;

    fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(KIND, &self.settings.name).scoped(&self.settings.domain_id)
    }

    fn fetch(&self) -> Result<Option<Enumeration>> {
        find_unique(
            self.catalog,
            &self.identity(),
            &[
                ("name", self.settings.name.as_str()),
                ("applicationDomainId", self.settings.domain_id.as_str()),
            ],
        )
    }

    fn diff(&self, current: &Enumeration) -> Result<Comparison> {
        compare(current, &self.desired(), FIELDS)
    }

    fn create(&self, ctx: &mut TaskContext<'_>) -> Result<Enumeration> {
        self.catalog
            .create(&self.desired())
            .map_err(api_error("create enum", ctx.identity()))
    }

    fn update(&self, current: &Enumeration, ctx: &mut TaskContext<'_>) -> Result<Enumeration> {
        let id = require_id(current, "update enum", ctx.identity())?;
        self.catalog
            .update(&id, &self.desired())
            .map_err(api_error("update enum", ctx.identity()))
    }
}

/// Resolves topic variables against enumerations in the catalog
///
/// Versions reconciled earlier in the same run are bound explicitly, so a
/// dry run can still see them; anything else is looked up.
pub struct CatalogVocabulary<'a> {
    catalog: &'a Catalog,
    known: HashMap<String, String>,
}

impl<'a> CatalogVocabulary<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            known: HashMap::new(),
        }
    }

    /// Bind `name` to an enumeration version id
    pub fn bind(&mut self, name: impl Into<String>, enum_version_id: impl Into<String>) {
        self.known.insert(name.into(), enum_version_id.into());
    }
}

impl VocabularyResolver for CatalogVocabulary<'_> {
    fn resolve(&self, name: &str, scope_id: &str) -> Result<Option<String>> {
        if let Some(id) = self.known.get(name) {
            return Ok(Some(id.clone()));
        }

        let identity = ResourceIdentity::new(KIND, name).scoped(scope_id);
        let Some(enumeration) = find_unique::<Enumeration>(
            self.catalog,
            &identity,
            &[("name", name), ("applicationDomainId", scope_id)],
        )?
        else {
            return Ok(None);
        };
        let enum_id = require_id(&enumeration, "resolve enum", &identity)?;

        let latest: Option<EnumVersion> = latest_version(self.catalog, &enum_id, &identity)?;
        Ok(latest.and_then(|v| v.id))
    }
}
