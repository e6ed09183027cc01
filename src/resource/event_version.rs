//! Event version resource

use crate::address::AddressSegment;
use catalog::{Address, AddressLevel, Catalog, DeliveryDescriptor, EventVersion};
use declarative::{Comparison, FieldSpec, Reconcile, ResourceIdentity, Result, TaskContext, compare};

use super::{VersionSettings, create_version, latest_version};

const KIND: &str = "event version";

pub const DEFAULT_BROKER_TYPE: &str = "solace";

// Topic levels match positionally, so their order is significant
const FIELDS: &[FieldSpec] = &[
    FieldSpec::ordered("description"),
    FieldSpec::ordered("displayName"),
    FieldSpec::ordered("stateId"),
    FieldSpec::ordered("schemaVersionId"),
    FieldSpec::ordered("deliveryDescriptor.brokerType"),
    FieldSpec::ordered("deliveryDescriptor.address.addressLevels"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventVersionSettings {
    pub event_id: String,
    pub event_name: String,
    pub version: VersionSettings,
    /// Schema version describing the payload
    pub schema_version_id: Option<String>,
    pub broker_type: String,
    /// Decomposed topic address
    pub address: Option<Vec<AddressSegment>>,
}

impl Default for EventVersionSettings {
    fn default() -> Self {
        Self {
            event_id: String::new(),
            event_name: String::new(),
            version: VersionSettings::default(),
            schema_version_id: None,
            broker_type: DEFAULT_BROKER_TYPE.to_string(),
            address: None,
        }
    }
}

pub struct EventVersionTask<'a> {
    catalog: &'a Catalog,
    settings: EventVersionSettings,
}

impl<'a> EventVersionTask<'a> {
    pub fn new(catalog: &'a Catalog, settings: EventVersionSettings) -> Self {
        Self { catalog, settings }
    }

    fn desired(&self, version: Option<String>) -> EventVersion {
        let settings = &self.settings.version;
        let address = self.settings.address.as_ref().map(|segments| {
            Address::topic(segments.iter().map(AddressLevel::from).collect())
        });

        EventVersion {
            id: None,
            event_id: self.settings.event_id.clone(),
            version,
            description: settings.description.clone(),
            display_name: settings.display_name.clone(),
            state_id: Some(settings.target_state.id().to_string()),
            schema_version_id: self.settings.schema_version_id.clone(),
            delivery_descriptor: Some(DeliveryDescriptor {
                broker_type: self.settings.broker_type.clone(),
                address,
            }),
        }
    }
}

impl Reconcile for EventVersionTask<'_> {
    type Resource = EventVersion;

    fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(KIND, &self.settings.event_name).scoped(&self.settings.event_id)
    }

    fn fetch(&self) -> Result<Option<EventVersion>> {
        latest_version(self.catalog, &self.settings.event_id, &self.identity())
    }

    fn diff(&self, current: &EventVersion) -> Result<Comparison> {
        compare(current, &self.desired(None), FIELDS)
    }

    fn create(&self, ctx: &mut TaskContext<'_>) -> Result<EventVersion> {
        let record = self.desired(Some(self.settings.version.initial_version()?));
        create_version(
            self.catalog,
            &record,
            self.settings.version.target_state,
            ctx,
        )
    }

    fn update(&self, current: &EventVersion, ctx: &mut TaskContext<'_>) -> Result<EventVersion> {
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
