//! Sync planner - derive desired resources from a document

use anyhow::{Result, bail};
use declarative::version;
use declarative::{BumpStrategy, LifecycleState};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::document::Document;
use crate::resource::VersionSettings;

/// Version used when the document does not carry one
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Knobs that do not come from the document itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    /// Domain name used when the document does not name one
    pub domain: Option<String>,
    pub bump: BumpStrategy,
    pub target_state: LifecycleState,
    pub shared_events: bool,
    pub broker_type: String,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            domain: None,
            bump: BumpStrategy::default(),
            target_state: LifecycleState::default(),
            shared_events: false,
            broker_type: crate::resource::event_version::DEFAULT_BROKER_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDomain {
    pub name: String,
    pub description: Option<String>,
}

/// A controlled vocabulary taken from a channel parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEnum {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSchema {
    pub name: String,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub content: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEvent {
    pub name: String,
    pub description: Option<String>,
    pub display_name: Option<String>,
    /// Channel carrying the message
    pub topic: Option<String>,
    /// Schema describing the payload (same name as the message)
    pub schema: Option<String>,
}

/// Desired resources in dependency order
#[derive(Debug, Clone, PartialEq)]
pub struct SyncPlan {
    pub domain: PlannedDomain,
    pub enums: Vec<PlannedEnum>,
    pub schemas: Vec<PlannedSchema>,
    pub events: Vec<PlannedEvent>,
    /// First version string of every new version
    pub version: String,
    pub options: PlanOptions,
}

impl SyncPlan {
    /// Build the plan for a document
    pub fn from_document(document: &Document, options: PlanOptions) -> Result<Self> {
        let domain = PlannedDomain {
            name: domain_name(document, &options)?,
            description: document
                .info
                .description
                .clone()
                .filter(|d| !d.trim().is_empty()),
        };

        let version = document
            .info
            .version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        if !version::is_valid(&version) {
            bail!("Document version '{version}' is not a semantic version");
        }

        let plan = Self {
            domain,
            enums: plan_enums(document),
            schemas: plan_schemas(document),
            events: plan_events(document),
            version,
            options,
        };
        log::debug!(
            "Planned domain '{}': {} enums, {} schemas, {} events",
            plan.domain.name,
            plan.enums.len(),
            plan.schemas.len(),
            plan.events.len()
        );
        Ok(plan)
    }

    /// Version settings for one versioned resource
    pub fn version_settings(
        &self,
        description: Option<&str>,
        display_name: Option<&str>,
    ) -> VersionSettings {
        VersionSettings {
            initial: self.version.clone(),
            bump: self.options.bump,
            target_state: self.options.target_state,
            description: description.map(str::to_string),
            display_name: display_name.map(str::to_string),
        }
    }

    /// Number of resources (including versions) the plan touches
    pub fn resource_count(&self) -> usize {
        1 + 2 * (self.enums.len() + self.schemas.len() + self.events.len())
    }
}

fn domain_name(document: &Document, options: &PlanOptions) -> Result<String> {
    let candidates = [
        document.info.domain_name.as_deref(),
        options.domain.as_deref(),
        Some(document.info.title.as_str()),
    ];
    match candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
    {
        Some(name) => Ok(name.to_string()),
        None => bail!("Document names no application domain (set x-domain-name, --domain or info.title)"),
    }
}

/// One enum per distinct parameter name that declares values
fn plan_enums(document: &Document) -> Vec<PlannedEnum> {
    let mut enums: BTreeMap<&str, PlannedEnum> = BTreeMap::new();
    for (channel, definition) in &document.channels {
        for (name, parameter) in &definition.parameters {
            let values = parameter.schema.enum_values();
            if values.is_empty() {
                continue;
            }
            match enums.entry(name.as_str()) {
                Entry::Occupied(existing) => {
                    if existing.get().values != values {
                        log::warn!(
                            "Parameter '{name}' in '{channel}' declares other values than an earlier channel; keeping the first"
                        );
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(PlannedEnum {
                        name: name.clone(),
                        description: parameter.description.clone(),
                        values,
                    });
                }
            }
        }
    }
    enums.into_values().collect()
}

fn plan_schemas(document: &Document) -> Vec<PlannedSchema> {
    document
        .components
        .messages
        .iter()
        .filter_map(|(name, message)| {
            message.payload.as_ref().map(|payload| PlannedSchema {
                name: name.clone(),
                description: message.description.clone(),
                display_name: message.title.clone(),
                content: payload.clone(),
            })
        })
        .collect()
}

fn plan_events(document: &Document) -> Vec<PlannedEvent> {
    document
        .components
        .messages
        .iter()
        .map(|(name, message)| {
            let topic = document.channel_for(name).map(str::to_string);
            if topic.is_none() {
                log::warn!("Message '{name}' is not used by any channel; its event gets no address");
            }
            PlannedEvent {
                name: name.clone(),
                description: message.description.clone(),
                display_name: message.title.clone(),
                topic,
                schema: message.payload.as_ref().map(|_| name.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::sample;

    #[test]
    fn test_plan_from_sample() {
        let plan = SyncPlan::from_document(&sample(), PlanOptions::default()).unwrap();

        assert_eq!(plan.domain.name, "orders");
        assert_eq!(plan.version, "1.0.0");

        assert_eq!(plan.enums.len(), 1);
        assert_eq!(plan.enums[0].name, "region");
        assert_eq!(plan.enums[0].values, vec!["eu", "us"]);

        let schemas: Vec<&str> = plan.schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(schemas, vec!["OrderCancelled", "OrderCreated"]);

        let created = plan.events.iter().find(|e| e.name == "OrderCreated").unwrap();
        assert_eq!(created.topic.as_deref(), Some("orders/{region}/created"));
        assert_eq!(created.schema.as_deref(), Some("OrderCreated"));
        assert_eq!(plan.resource_count(), 11);
    }

    #[test]
    fn test_domain_name_fallbacks() {
        let mut document = sample();
        document.info.domain_name = None;

        let options = PlanOptions {
            domain: Some("sales".to_string()),
            ..Default::default()
        };
        let plan = SyncPlan::from_document(&document, options).unwrap();
        assert_eq!(plan.domain.name, "sales");

        let plan = SyncPlan::from_document(&document, PlanOptions::default()).unwrap();
        assert_eq!(plan.domain.name, "Orders API");

        document.info.title = "  ".to_string();
        assert!(SyncPlan::from_document(&document, PlanOptions::default()).is_err());
    }

    #[test]
    fn test_invalid_document_version_rejected() {
        let mut document = sample();
        document.info.version = Some("v2".to_string());
        let err = SyncPlan::from_document(&document, PlanOptions::default()).unwrap_err();
        assert!(err.to_string().contains("v2"));

        document.info.version = None;
        let plan = SyncPlan::from_document(&document, PlanOptions::default()).unwrap();
        assert_eq!(plan.version, DEFAULT_VERSION);
    }

    #[test]
    fn test_blank_description_is_not_planned() {
        let mut document = sample();
        document.info.description = None;
        let plan = SyncPlan::from_document(&document, PlanOptions::default()).unwrap();
        assert_eq!(plan.domain.description, None);

        document.info.description = Some(" ".to_string());
        let plan = SyncPlan::from_document(&document, PlanOptions::default()).unwrap();
        assert_eq!(plan.domain.description, None);
    }

    #[test]
    fn test_message_without_payload_has_no_schema() {
        let mut document = sample();
        if let Some(message) = document.components.messages.get_mut("OrderCancelled") {
            message.payload = None;
        }
        let plan = SyncPlan::from_document(&document, PlanOptions::default()).unwrap();

        assert_eq!(plan.schemas.len(), 1);
        let cancelled = plan.events.iter().find(|e| e.name == "OrderCancelled").unwrap();
        assert_eq!(cancelled.schema, None);
        assert_eq!(cancelled.topic.as_deref(), Some("orders/cancelled"));
    }
}
