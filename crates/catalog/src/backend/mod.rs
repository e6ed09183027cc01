//! Backend trait and implementations for reaching the catalog.
//!
//! [`CatalogClient`] is the JSON-level seam between reconciliation and the
//! catalog service. The production implementation is
//! [`http::HttpCatalog`]; [`MemoryCatalog`] keeps everything in memory.
//!
//! # Testing
//!
//! Use [`MemoryCatalog`] for testing without network access:
//!
//! ```
//! use catalog::backend::{CatalogClient, MemoryCatalog};
//! use catalog::Collection;
//! use serde_json::json;
//!
//! let memory = MemoryCatalog::new();
//! let created = memory
//!     .create(Collection::ApplicationDomains, &json!({"name": "orders"}))
//!     .unwrap();
//! assert!(created["id"].is_string());
//!
//! let found = memory
//!     .list(Collection::ApplicationDomains, &[("name", "orders")])
//!     .unwrap();
//! assert_eq!(found.len(), 1);
//! assert_eq!(memory.mutation_count(), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::Collection;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lifecycle state id the catalog assigns to new versions.
pub const INITIAL_STATE_ID: &str = "1";

/// Backend trait for catalog operations.
///
/// Bodies and results are raw JSON records (the `data` payload of the
/// catalog's envelopes). Implementations never retry.
pub trait CatalogClient: Send + Sync {
    /// List records of a collection matching all `filters` (field, value).
    fn list(&self, collection: Collection, filters: &[(&str, &str)]) -> Result<Vec<Value>>;

    /// Fetch a single record by id.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if no record has that id.
    fn get(&self, collection: Collection, id: &str) -> Result<Value>;

    /// Create a record; returns it with server-assigned fields filled in.
    fn create(&self, collection: Collection, body: &Value) -> Result<Value>;

    /// Update a record in place. Versioned collections reject this.
    fn update(&self, collection: Collection, id: &str, body: &Value) -> Result<Value>;

    /// Move a version to another lifecycle state.
    ///
    /// Does not return the updated record; fetch it again to observe the
    /// new state.
    fn change_state(&self, collection: Collection, id: &str, state_id: &str) -> Result<()>;
}

/// Kind of mutating call recorded by [`MemoryCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    ChangeState,
}

/// A mutating call recorded by [`MemoryCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    pub collection: Collection,
    /// Id of the affected record
    pub id: String,
}

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<Collection, Vec<Value>>,
    next_id: u64,
    journal: Vec<Call>,
}

impl State {
    fn assign_id(&mut self, collection: Collection) -> String {
        self.next_id += 1;
        format!("{}-{}", collection.path(), self.next_id)
    }

    fn find_mut(&mut self, collection: Collection, id: &str) -> Result<&mut Map<String, Value>> {
        self.records
            .get_mut(&collection)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            })
            .and_then(Value::as_object_mut)
            .ok_or_else(|| Error::NotFound {
                collection: collection.path().to_string(),
                id: id.to_string(),
            })
    }
}

/// In-memory catalog for tests and dry experiments.
///
/// Assigns ids on create, starts every version in the initial lifecycle
/// state, keeps versions append-only and journals every mutating call.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<Mutex<State>>,
}

impl MemoryCatalog {
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a record without journaling it. Assigns an id when missing.
    pub fn insert(&self, collection: Collection, mut record: Value) -> Value {
        let mut state = self.lock();
        if record.get("id").is_none_or(Value::is_null) {
            let id = state.assign_id(collection);
            if let Some(object) = record.as_object_mut() {
                object.insert("id".to_string(), Value::String(id));
            }
        }
        state
            .records
            .entry(collection)
            .or_default()
            .push(record.clone());
        record
    }

    /// All records of a collection, in insertion order.
    #[must_use]
    pub fn records(&self, collection: Collection) -> Vec<Value> {
        self.lock()
            .records
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Mutating calls made so far.
    #[must_use]
    pub fn journal(&self) -> Vec<Call> {
        self.lock().journal.clone()
    }

    /// Number of mutating calls made so far.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.lock().journal.len()
    }
}

fn matches(record: &Value, filters: &[(&str, &str)]) -> bool {
    filters.iter().all(|(field, expected)| match record.get(*field) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Bool(b)) => b.to_string() == *expected,
        Some(Value::Number(n)) => n.to_string() == *expected,
        _ => false,
    })
}

impl CatalogClient for MemoryCatalog {
    fn list(&self, collection: Collection, filters: &[(&str, &str)]) -> Result<Vec<Value>> {
        let state = self.lock();
        Ok(state
            .records
            .get(&collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| matches(r, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get(&self, collection: Collection, id: &str) -> Result<Value> {
        let mut state = self.lock();
        state.find_mut(collection, id).map(|r| Value::Object(r.clone()))
    }

    fn create(&self, collection: Collection, body: &Value) -> Result<Value> {
        let Some(fields) = body.as_object() else {
            return Err(Error::http(400, format!("{collection}: body must be an object")));
        };

        let mut state = self.lock();
        let id = state.assign_id(collection);
        let mut record = fields.clone();
        record.insert("id".to_string(), Value::String(id.clone()));
        if collection.is_versioned() {
            record.insert(
                "stateId".to_string(),
                Value::String(INITIAL_STATE_ID.to_string()),
            );
        }

        let record = Value::Object(record);
        state
            .records
            .entry(collection)
            .or_default()
            .push(record.clone());
        state.journal.push(Call {
            operation: Operation::Create,
            collection,
            id,
        });
        Ok(record)
    }

    fn update(&self, collection: Collection, id: &str, body: &Value) -> Result<Value> {
        if collection.is_versioned() {
            return Err(Error::http(
                405,
                format!("{collection} are immutable; create a new version instead"),
            ));
        }
        let Some(fields) = body.as_object() else {
            return Err(Error::http(400, format!("{collection}: body must be an object")));
        };

        let mut state = self.lock();
        let record = state.find_mut(collection, id)?;
        for (key, value) in fields {
            if key != "id" {
                record.insert(key.clone(), value.clone());
            }
        }
        let updated = Value::Object(record.clone());
        state.journal.push(Call {
            operation: Operation::Update,
            collection,
            id: id.to_string(),
        });
        Ok(updated)
    }

    fn change_state(&self, collection: Collection, id: &str, state_id: &str) -> Result<()> {
        if !collection.is_versioned() {
            return Err(Error::http(
                400,
                format!("{collection} have no lifecycle state"),
            ));
        }

        let mut state = self.lock();
        let record = state.find_mut(collection, id)?;
        record.insert("stateId".to_string(), Value::String(state_id.to_string()));
        state.journal.push(Call {
            operation: Operation::ChangeState,
            collection,
            id: id.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_catalog_new() {
        let memory = MemoryCatalog::new();
        let events = memory.list(Collection::Events, &[]).unwrap();
        assert!(events.is_empty());
        assert_eq!(memory.mutation_count(), 0);
    }

    #[test]
    fn test_memory_catalog_create_assigns_id() {
        let memory = MemoryCatalog::new();
        let a = memory
            .create(Collection::Events, &json!({"name": "A"}))
            .unwrap();
        let b = memory
            .create(Collection::Events, &json!({"name": "B"}))
            .unwrap();

        assert_ne!(a["id"], b["id"]);
        assert_eq!(memory.journal().len(), 2);
        assert_eq!(memory.journal()[0].operation, Operation::Create);
    }

    #[test]
    fn test_memory_catalog_versions_start_in_initial_state() {
        let memory = MemoryCatalog::new();
        let version = memory
            .create(
                Collection::SchemaVersions,
                &json!({"schemaId": "s-1", "version": "1.0.0", "stateId": "2"}),
            )
            .unwrap();
        assert_eq!(version["stateId"], INITIAL_STATE_ID);
    }

    #[test]
    fn test_memory_catalog_list_filters() {
        let memory = MemoryCatalog::new();
        memory.insert(
            Collection::Events,
            json!({"name": "A", "applicationDomainId": "d-1", "shared": true}),
        );
        memory.insert(
            Collection::Events,
            json!({"name": "A", "applicationDomainId": "d-2"}),
        );

        let scoped = memory
            .list(
                Collection::Events,
                &[("name", "A"), ("applicationDomainId", "d-1")],
            )
            .unwrap();
        assert_eq!(scoped.len(), 1);

        let shared = memory.list(Collection::Events, &[("shared", "true")]).unwrap();
        assert_eq!(shared.len(), 1);

        // Seeding is not a mutating call
        assert_eq!(memory.mutation_count(), 0);
    }

    #[test]
    fn test_memory_catalog_update_merges_fields() {
        let memory = MemoryCatalog::new();
        let domain = memory.insert(
            Collection::ApplicationDomains,
            json!({"name": "orders", "description": "old"}),
        );
        let id = domain["id"].as_str().unwrap();

        let updated = memory
            .update(
                Collection::ApplicationDomains,
                id,
                &json!({"id": "ignored", "description": "new"}),
            )
            .unwrap();

        assert_eq!(updated["id"], id);
        assert_eq!(updated["name"], "orders");
        assert_eq!(updated["description"], "new");
    }

    #[test]
    fn test_memory_catalog_versions_are_immutable() {
        let memory = MemoryCatalog::new();
        let version = memory.insert(
            Collection::EnumVersions,
            json!({"enumId": "e-1", "version": "1.0.0"}),
        );
        let id = version["id"].as_str().unwrap();

        let err = memory
            .update(Collection::EnumVersions, id, &json!({"version": "2.0.0"}))
            .unwrap_err();
        assert_eq!(err.status(), Some(405));
        assert_eq!(memory.records(Collection::EnumVersions)[0]["version"], "1.0.0");
    }

    #[test]
    fn test_memory_catalog_change_state() {
        let memory = MemoryCatalog::new();
        let version = memory
            .create(
                Collection::EventVersions,
                &json!({"eventId": "ev-1", "version": "1.0.0"}),
            )
            .unwrap();
        let id = version["id"].as_str().unwrap();

        memory
            .change_state(Collection::EventVersions, id, "2")
            .unwrap();

        let fetched = memory.get(Collection::EventVersions, id).unwrap();
        assert_eq!(fetched["stateId"], "2");
        assert_eq!(memory.journal()[1].operation, Operation::ChangeState);
    }

    #[test]
    fn test_memory_catalog_get_not_found() {
        let memory = MemoryCatalog::new();
        let err = memory.get(Collection::Schemas, "nope").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
