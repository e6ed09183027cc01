//! # catalog
//!
//! Client for a versioned event catalog.
//!
//! The catalog stores application domains and, inside them, events, schemas
//! and enumerations. Each of the latter three has an append-only history of
//! versions, and every version carries a lifecycle state.
//!
//! ## Example
//!
//! ```
//! use catalog::{Catalog, Enumeration, MemoryCatalog};
//!
//! let catalog = Catalog::with_backend(Box::new(MemoryCatalog::new()));
//!
//! let created = catalog
//!     .create(&Enumeration {
//!         name: "region".to_string(),
//!         application_domain_id: "dom-1".to_string(),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! let found: Vec<Enumeration> = catalog
//!     .find(&[("name", "region"), ("applicationDomainId", "dom-1")])
//!     .unwrap();
//! assert_eq!(found[0].id, created.id);
//! ```

#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod types;

pub use backend::{CatalogClient, MemoryCatalog};
pub use error::{Error, ErrorCategory, Result};
pub use types::{
    Address, AddressLevel, AddressLevelType, ApplicationDomain, Collection, DeliveryDescriptor,
    EnumValue, EnumVersion, Enumeration, Event, EventVersion, Record, Schema, SchemaVersion,
    VersionRecord,
};

use backend::http::{HttpCatalog, HttpConfig};
use serde_json::Value;

/// Typed access to a catalog backend.
///
/// Converts between [`Record`] types and the JSON the backend speaks.
pub struct Catalog {
    backend: Box<dyn CatalogClient>,
}

impl Catalog {
    /// Create a catalog talking to the REST API.
    #[must_use]
    pub fn http(config: HttpConfig) -> Self {
        Self {
            backend: Box::new(HttpCatalog::new(config)),
        }
    }

    /// Create a catalog with a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(backend: Box<dyn CatalogClient>) -> Self {
        Self { backend }
    }

    /// Records of `R`'s collection matching all filters.
    pub fn find<R: Record>(&self, filters: &[(&str, &str)]) -> Result<Vec<R>> {
        self.backend
            .list(R::COLLECTION, filters)?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// All versions belonging to `parent_id`.
    pub fn versions<R: VersionRecord>(&self, parent_id: &str) -> Result<Vec<R>> {
        match R::COLLECTION.parent_field() {
            Some(field) => self.find(&[(field, parent_id)]),
            None => self.find(&[]),
        }
    }

    /// Fetch one record by id.
    pub fn get<R: Record>(&self, id: &str) -> Result<R> {
        decode(self.backend.get(R::COLLECTION, id)?)
    }

    /// Create a record and return the catalog's copy.
    pub fn create<R: Record>(&self, record: &R) -> Result<R> {
        let body = serde_json::to_value(record)?;
        decode(self.backend.create(R::COLLECTION, &body)?)
    }

    /// Update a record in place and return the catalog's copy.
    pub fn update<R: Record>(&self, id: &str, record: &R) -> Result<R> {
        let body = serde_json::to_value(record)?;
        decode(self.backend.update(R::COLLECTION, id, &body)?)
    }

    /// Move a version to another lifecycle state.
    pub fn change_state<R: VersionRecord>(&self, id: &str, state_id: &str) -> Result<()> {
        self.backend.change_state(R::COLLECTION, id, state_id)
    }
}

fn decode<R: Record>(value: Value) -> Result<R> {
    Ok(serde_json::from_value(value)?)
}
