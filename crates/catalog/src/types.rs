//! Wire types for catalog records.
//!
//! Field names follow the catalog's camelCase JSON. Server-assigned fields
//! (`id`, `stateId` on versions) are optional so the same structs serve as
//! create payloads and as responses.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A catalog collection (one per resource kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    /// Application domains (top-level scopes)
    ApplicationDomains,
    /// Events, scoped to a domain
    Events,
    /// Versions of an event
    EventVersions,
    /// Schemas, scoped to a domain
    Schemas,
    /// Versions of a schema
    SchemaVersions,
    /// Enumerations, scoped to a domain
    Enums,
    /// Versions of an enumeration
    EnumVersions,
}

impl Collection {
    /// All collections.
    pub const ALL: [Self; 7] = [
        Self::ApplicationDomains,
        Self::Events,
        Self::EventVersions,
        Self::Schemas,
        Self::SchemaVersions,
        Self::Enums,
        Self::EnumVersions,
    ];

    /// URL path segment of this collection.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::ApplicationDomains => "applicationDomains",
            Self::Events => "events",
            Self::EventVersions => "eventVersions",
            Self::Schemas => "schemas",
            Self::SchemaVersions => "schemaVersions",
            Self::Enums => "enums",
            Self::EnumVersions => "enumVersions",
        }
    }

    /// Whether records in this collection are immutable versions.
    #[must_use]
    pub fn is_versioned(self) -> bool {
        matches!(
            self,
            Self::EventVersions | Self::SchemaVersions | Self::EnumVersions
        )
    }

    /// Field that links a record to its owner, if any.
    #[must_use]
    pub fn parent_field(self) -> Option<&'static str> {
        match self {
            Self::ApplicationDomains => None,
            Self::Events | Self::Schemas | Self::Enums => Some("applicationDomainId"),
            Self::EventVersions => Some("eventId"),
            Self::SchemaVersions => Some("schemaId"),
            Self::EnumVersions => Some("enumId"),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// A typed record stored in a collection.
pub trait Record: Serialize + DeserializeOwned {
    /// Collection the record lives in.
    const COLLECTION: Collection;

    /// Catalog-assigned id.
    fn id(&self) -> Option<&str>;
}

/// A record that is one version of a versioned resource.
pub trait VersionRecord: Record {
    /// Semantic version string.
    fn version(&self) -> Option<&str>;

    /// Lifecycle state id.
    fn state_id(&self) -> Option<&str>;
}

macro_rules! record {
    ($ty:ty, $collection:expr) => {
        impl Record for $ty {
            const COLLECTION: Collection = $collection;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }
        }
    };
}

macro_rules! version_record {
    ($ty:ty, $collection:expr) => {
        record!($ty, $collection);

        impl VersionRecord for $ty {
            fn version(&self) -> Option<&str> {
                self.version.as_deref()
            }

            fn state_id(&self) -> Option<&str> {
                self.state_id.as_deref()
            }
        }
    };
}

/// Application domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub unique_topic_address_enforcement_enabled: bool,
    #[serde(default)]
    pub topic_domain_enforcement_enabled: bool,
}

/// Event (versioned through [`EventVersion`])
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub application_domain_id: String,
    #[serde(default)]
    pub shared: bool,
}

/// Schema (versioned through [`SchemaVersion`])
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub application_domain_id: String,
    #[serde(default)]
    pub shared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Enumeration (versioned through [`EnumVersion`])
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enumeration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub application_domain_id: String,
    #[serde(default)]
    pub shared: bool,
}

/// How a topic level is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressLevelType {
    Literal,
    Variable,
}

/// One level of a topic address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressLevel {
    pub name: String,
    pub address_level_type: AddressLevelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_version_id: Option<String>,
}

/// Topic address of an event version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address_levels: Vec<AddressLevel>,
    #[serde(default = "default_address_type")]
    pub address_type: String,
}

fn default_address_type() -> String {
    "topic".to_string()
}

impl Address {
    pub fn topic(address_levels: Vec<AddressLevel>) -> Self {
        Self {
            address_levels,
            address_type: default_address_type(),
        }
    }
}

/// Where and how an event version is delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDescriptor {
    pub broker_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// Version of an event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_descriptor: Option<DeliveryDescriptor>,
}

/// Version of a schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub schema_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    /// Schema body, serialized as text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One allowed value of an enumeration version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl EnumValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
        }
    }
}

/// Version of an enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub enum_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    #[serde(default)]
    pub values: Vec<EnumValue>,
}

record!(ApplicationDomain, Collection::ApplicationDomains);
record!(Event, Collection::Events);
record!(Schema, Collection::Schemas);
record!(Enumeration, Collection::Enums);
version_record!(EventVersion, Collection::EventVersions);
version_record!(SchemaVersion, Collection::SchemaVersions);
version_record!(EnumVersion, Collection::EnumVersions);
