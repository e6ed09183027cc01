//! Topic address decomposition
//!
//! Splits a slash-delimited topic expression into ordered segments. A token
//! wrapped in `{}` is a variable; when an enumeration with the token's name
//! exists in the scope, the segment is bound to that enumeration's latest
//! version. Segment order mirrors token order: the catalog matches topics
//! positionally.

use catalog::{AddressLevel, AddressLevelType};
use declarative::Result;
use std::collections::HashMap;
use std::fmt;

/// Kind of an address segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Literal,
    Variable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSegment {
    /// Literal text, or the variable's bare name
    pub name: String,
    pub kind: SegmentKind,
    /// Enumeration version constraining a variable segment
    pub enum_version_id: Option<String>,
}

impl AddressSegment {
    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SegmentKind::Literal,
            enum_version_id: None,
        }
    }

    pub fn variable(name: impl Into<String>, enum_version_id: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind: SegmentKind::Variable,
            enum_version_id,
        }
    }
}

impl fmt::Display for AddressSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SegmentKind::Literal => write!(f, "{}", self.name),
            SegmentKind::Variable => write!(f, "{{{}}}", self.name),
        }
    }
}

impl From<&AddressSegment> for AddressLevel {
    fn from(segment: &AddressSegment) -> Self {
        Self {
            name: segment.name.clone(),
            address_level_type: match segment.kind {
                SegmentKind::Literal => AddressLevelType::Literal,
                SegmentKind::Variable => AddressLevelType::Variable,
            },
            enum_version_id: segment.enum_version_id.clone(),
        }
    }
}

/// Looks up controlled-vocabulary resources by name
pub trait VocabularyResolver {
    /// Latest enumeration version id for `name` within `scope_id`, if the
    /// enumeration exists
    fn resolve(&self, name: &str, scope_id: &str) -> Result<Option<String>>;
}

/// Fixed name → enumeration version id bindings (scope is ignored)
impl VocabularyResolver for HashMap<String, String> {
    fn resolve(&self, name: &str, _scope_id: &str) -> Result<Option<String>> {
        Ok(self.get(name).cloned())
    }
}

/// Decompose a topic expression into typed segments
pub fn decompose(
    expression: &str,
    scope_id: &str,
    resolver: &dyn VocabularyResolver,
) -> Result<Vec<AddressSegment>> {
    expression
        .split('/')
        .map(|token| {
            if token.is_empty() {
                log::warn!("Empty segment in topic address '{expression}'");
            }
            match token
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                Some(name) => {
                    let bound = resolver.resolve(name, scope_id)?;
                    if bound.is_none() {
                        log::debug!("Variable '{name}' in '{expression}' has no enumeration");
                    }
                    Ok(AddressSegment::variable(name, bound))
                }
                None => Ok(AddressSegment::literal(token)),
            }
        })
        .collect()
}

/// Render segments back into a topic expression
pub fn render(segments: &[AddressSegment]) -> String {
    segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_unbound_variable_between_literals() {
        let segments = decompose("a/{b}/c", "dom-1", &none()).unwrap();
        assert_eq!(
            segments,
            vec![
                AddressSegment::literal("a"),
                AddressSegment::variable("b", None),
                AddressSegment::literal("c"),
            ]
        );
    }

    #[test]
    fn test_variable_bound_to_enumeration() {
        let mut known = HashMap::new();
        known.insert("region".to_string(), "ev-42".to_string());

        let segments = decompose("orders/{region}/created", "dom-1", &known).unwrap();
        assert_eq!(segments[1].kind, SegmentKind::Variable);
        assert_eq!(segments[1].name, "region");
        assert_eq!(segments[1].enum_version_id.as_deref(), Some("ev-42"));
        assert_eq!(segments[2].enum_version_id, None);
    }

    #[test]
    fn test_empty_tokens_are_kept() {
        let segments = decompose("a//b/", "dom-1", &none()).unwrap();
        let names: Vec<_> = segments.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "", "b", ""]);
        assert!(segments.iter().all(|s| s.kind == SegmentKind::Literal));
    }

    #[test]
    fn test_unbalanced_braces_are_literal() {
        let segments = decompose("{open/close}", "dom-1", &none()).unwrap();
        assert_eq!(segments[0], AddressSegment::literal("{open"));
        assert_eq!(segments[1], AddressSegment::literal("close}"));
    }

    #[test]
    fn test_render_round_trips_expression() {
        let expression = "orders/{region}/v1/{id}";
        let segments = decompose(expression, "dom-1", &none()).unwrap();
        assert_eq!(render(&segments), expression);
    }

    #[test]
    fn test_address_level_conversion() {
        let level = AddressLevel::from(&AddressSegment::variable("region", Some("v-1".into())));
        assert_eq!(level.address_level_type, AddressLevelType::Variable);
        assert_eq!(level.enum_version_id.as_deref(), Some("v-1"));
    }
}
