//! Application domain resource

use catalog::{ApplicationDomain, Catalog};
use declarative::{Comparison, FieldSpec, Reconcile, ResourceIdentity, Result, TaskContext, compare};

use super::{api_error, find_unique, require_id};

const KIND: &str = "application domain";

const FIELDS: &[FieldSpec] = &[
    FieldSpec::ordered("description"),
    FieldSpec::ordered("uniqueTopicAddressEnforcementEnabled"),
    FieldSpec::ordered("topicDomainEnforcementEnabled"),
];

/// Desired application domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainSettings {
    pub name: String,
    pub description: Option<String>,
    pub unique_topic_address_enforcement: bool,
    pub topic_domain_enforcement: bool,
}

pub struct DomainTask<'a> {
    catalog: &'a Catalog,
    settings: DomainSettings,
}

impl<'a> DomainTask<'a> {
    pub fn new(catalog: &'a Catalog, settings: DomainSettings) -> Self {
        Self { catalog, settings }
    }

    fn desired(&self) -> ApplicationDomain {
        ApplicationDomain {
            id: None,
            name: self.settings.name.clone(),
            description: self.settings.description.clone(),
            unique_topic_address_enforcement_enabled: self.settings.unique_topic_address_enforcement,
            topic_domain_enforcement_enabled: self.settings.topic_domain_enforcement,
        }
    }
}

impl Reconcile for DomainTask<'_> {
    type Resource = ApplicationDomain;

    fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(KIND, &self.settings.name)
    }

    fn fetch(&self) -> Result<Option<ApplicationDomain>> {
        find_unique(
            self.catalog,
            &self.identity(),
            &[("name", self.settings.name.as_str())],
        )
    }

    fn diff(&self, current: &ApplicationDomain) -> Result<Comparison> {
        compare(current, &self.desired(), FIELDS)
    }

    fn create(&self, ctx: &mut TaskContext<'_>) -> Result<ApplicationDomain> {
        self.catalog
            .create(&self.desired())
            .map_err(api_error("create application domain", ctx.identity()))
    }

    fn update(
        &self,
        current: &ApplicationDomain,
        ctx: &mut TaskContext<'_>,
    ) -> Result<ApplicationDomain> {
        let operation = "update application domain";
        let id = require_id(current, operation, ctx.identity())?;
        self.catalog
            .update(&id, &self.desired())
            .map_err(api_error(operation, ctx.identity()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::memory;
    use catalog::Collection;
    use catalog::backend::Operation;
    use declarative::{Action, NoProgress, reconcile};
    use serde_json::json;

    fn settings() -> DomainSettings {
        DomainSettings {
            name: "orders".to_string(),
            description: Some("Order lifecycle".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_domain_is_created_once() {
        let (memory, catalog) = memory();
        let outcome = reconcile(&DomainTask::new(&catalog, settings()), &mut NoProgress).unwrap();

        assert_eq!(outcome.action, Action::Created);
        assert!(outcome.resource.id.is_some());
        assert_eq!(memory.records(Collection::ApplicationDomains).len(), 1);
        assert_eq!(memory.mutation_count(), 1);
    }

    #[test]
    fn test_identical_domain_is_left_alone() {
        let (memory, catalog) = memory();
        memory.insert(
            Collection::ApplicationDomains,
            json!({
                "id": "dom-1",
                "name": "orders",
                "description": "Order lifecycle",
                "uniqueTopicAddressEnforcementEnabled": false,
                "topicDomainEnforcementEnabled": false,
                "createdTime": "2024-01-15T00:00:00Z"
            }),
        );

        let outcome = reconcile(&DomainTask::new(&catalog, settings()), &mut NoProgress).unwrap();

        assert_eq!(outcome.action, Action::Unchanged);
        assert_eq!(outcome.resource.id.as_deref(), Some("dom-1"));
        assert_eq!(memory.mutation_count(), 0);
    }

    #[test]
    fn test_domain_without_description_matches_null() {
        let (memory, catalog) = memory();
        memory.insert(
            Collection::ApplicationDomains,
            json!({
                "id": "dom-1",
                "name": "orders",
                "description": null,
                "uniqueTopicAddressEnforcementEnabled": false,
                "topicDomainEnforcementEnabled": false
            }),
        );
        let undescribed = DomainSettings {
            description: None,
            ..settings()
        };

        let outcome = reconcile(&DomainTask::new(&catalog, undescribed), &mut NoProgress).unwrap();

        assert_eq!(outcome.action, Action::Unchanged);
        assert_eq!(memory.mutation_count(), 0);
    }

    #[test]
    fn test_changed_domain_is_updated_in_place() {
        let (memory, catalog) = memory();
        memory.insert(
            Collection::ApplicationDomains,
            json!({"id": "dom-1", "name": "orders", "description": "old"}),
        );

        let outcome = reconcile(&DomainTask::new(&catalog, settings()), &mut NoProgress).unwrap();

        assert_eq!(outcome.action, Action::Updated);
        assert!(outcome.difference.unwrap().names("description"));
        assert_eq!(outcome.resource.description.as_deref(), Some("Order lifecycle"));

        let journal = memory.journal();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].operation, Operation::Update);
        assert_eq!(journal[0].id, "dom-1");
    }
}
