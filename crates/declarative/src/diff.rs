//! Structural comparison of catalog records against desired payloads
//!
//! Comparison is restricted to a caller-chosen field subset, so server-owned
//! fields (ids, timestamps, audit data) never cause an update. Objects compare
//! key-wise regardless of key order. Arrays compare positionally unless the
//! field is declared order-insensitive, in which case both sides are sorted
//! into a canonical order first. Absent and `null` are the same thing.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeSet;
use std::fmt;

/// Whether element order inside a compared field matters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Positional comparison (e.g. topic address segments)
    Significant,
    /// Set-like comparison (e.g. enumeration values)
    Insignificant,
}

/// A field taking part in the comparison
///
/// `path` is dot-separated and addresses nested objects, e.g.
/// `deliveryDescriptor.address.addressLevels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub path: &'static str,
    pub order: Order,
}

impl FieldSpec {
    pub const fn ordered(path: &'static str) -> Self {
        Self {
            path,
            order: Order::Significant,
        }
    }

    pub const fn unordered(path: &'static str) -> Self {
        Self {
            path,
            order: Order::Insignificant,
        }
    }
}

/// Kind of a single field difference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Only the requested side has a value
    Added,
    /// Only the existing side has a value
    Removed,
    /// Both sides have different values
    Modified,
}

/// A single leaf-level difference
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    /// Location, e.g. `values[2].label`
    pub path: String,
    pub kind: ChangeKind,
    pub existing: Option<Value>,
    pub requested: Option<Value>,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.existing, &self.requested) {
            (Some(old), Some(new)) => write!(f, "{}: {} → {}", self.path, old, new),
            (None, Some(new)) => write!(f, "{}: (unset) → {}", self.path, new),
            (Some(old), None) => write!(f, "{}: {} → (unset)", self.path, old),
            (None, None) => write!(f, "{}", self.path),
        }
    }
}

/// Machine-usable difference between two projections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Difference {
    changes: Vec<FieldChange>,
    existing: Value,
    requested: Value,
}

impl Difference {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    /// Check whether a compared field (or anything below it) differs
    pub fn names(&self, field: &str) -> bool {
        self.changes.iter().any(|c| {
            c.path == field
                || c.path
                    .strip_prefix(field)
                    .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
        })
    }

    /// Paths of all differing leaves
    pub fn paths(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.path.as_str()).collect()
    }

    /// Render as changed lines of the pretty-printed projections
    ///
    /// Each line starts with `- ` (existing) or `+ ` (requested).
    pub fn render(&self) -> String {
        let old = serde_json::to_string_pretty(&self.existing).unwrap_or_default();
        let new = serde_json::to_string_pretty(&self.requested).unwrap_or_default();
        let diff = TextDiff::from_lines(&old, &new);

        let mut out = String::new();
        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "- ",
                ChangeTag::Insert => "+ ",
                ChangeTag::Equal => continue,
            };
            out.push_str(sign);
            out.push_str(change.value().trim_end_matches('\n'));
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.changes.is_empty() {
            return write!(f, "no differences");
        }
        let parts: Vec<String> = self.changes.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Outcome of a structural comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub is_equal: bool,
    pub difference: Difference,
}

/// Compare two serializable values over a field subset
pub fn compare<E, R>(existing: &E, requested: &R, fields: &[FieldSpec]) -> Result<Comparison>
where
    E: Serialize + ?Sized,
    R: Serialize + ?Sized,
{
    let existing =
        serde_json::to_value(existing).map_err(|e| Error::serialization("existing state", e))?;
    let requested =
        serde_json::to_value(requested).map_err(|e| Error::serialization("desired state", e))?;
    Ok(compare_values(&existing, &requested, fields))
}

/// Compare two JSON values over a field subset
pub fn compare_values(existing: &Value, requested: &Value, fields: &[FieldSpec]) -> Comparison {
    let existing = project(existing, fields);
    let requested = project(requested, fields);

    let mut changes = Vec::new();
    for field in fields {
        walk(
            field.path,
            existing.get(field.path),
            requested.get(field.path),
            &mut changes,
        );
    }

    Comparison {
        is_equal: changes.is_empty(),
        difference: Difference {
            changes,
            existing: Value::Object(existing),
            requested: Value::Object(requested),
        },
    }
}

/// Extract and normalize the compared fields, keyed by field path
fn project(value: &Value, fields: &[FieldSpec]) -> Map<String, Value> {
    let mut out = Map::new();
    for field in fields {
        let pointer = format!("/{}", field.path.replace('.', "/"));
        if let Some(found) = value.pointer(&pointer)
            && let Some(normalized) = normalize(found, field.order)
        {
            out.insert(field.path.to_string(), normalized);
        }
    }
    out
}

/// Drop nulls; sort arrays canonically for order-insensitive fields
fn normalize(value: &Value, order: Order) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => Some(Value::Object(
            map.iter()
                .filter_map(|(k, v)| normalize(v, order).map(|v| (k.clone(), v)))
                .collect(),
        )),
        Value::Array(items) => {
            let mut items: Vec<Value> = items
                .iter()
                .map(|v| normalize(v, order).unwrap_or(Value::Null))
                .collect();
            if order == Order::Insignificant {
                items.sort_by_cached_key(canonical);
            }
            Some(Value::Array(items))
        }
        other => Some(other.clone()),
    }
}

/// Key-sorted rendering, independent of map insertion order
fn canonical(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let inner: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{k:?}:{}", canonical(v)))
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(canonical).collect();
            format!("[{}]", inner.join(","))
        }
        other => other.to_string(),
    }
}

fn walk(path: &str, existing: Option<&Value>, requested: Option<&Value>, out: &mut Vec<FieldChange>) {
    match (existing, requested) {
        (None, None) => {}
        (None, Some(new)) => out.push(FieldChange {
            path: path.to_string(),
            kind: ChangeKind::Added,
            existing: None,
            requested: Some(new.clone()),
        }),
        (Some(old), None) => out.push(FieldChange {
            path: path.to_string(),
            kind: ChangeKind::Removed,
            existing: Some(old.clone()),
            requested: None,
        }),
        (Some(Value::Object(old)), Some(Value::Object(new))) => {
            let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
            for key in keys {
                walk(&format!("{path}.{key}"), old.get(key), new.get(key), out);
            }
        }
        (Some(Value::Array(old)), Some(Value::Array(new))) => {
            for i in 0..old.len().max(new.len()) {
                walk(&format!("{path}[{i}]"), old.get(i), new.get(i), out);
            }
        }
        (Some(old), Some(new)) => {
            if old != new {
                out.push(FieldChange {
                    path: path.to_string(),
                    kind: ChangeKind::Modified,
                    existing: Some(old.clone()),
                    requested: Some(new.clone()),
                });
            }
        }
    }
}
