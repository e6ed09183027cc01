//! Drift report between two desired-state documents
//!
//! Read-only: produces an ordered list of [`ChangeAction`]s for people to
//! read and never touches the catalog.
//!
//! Order of the report:
//! 1. channels of the existing document, in name order: `REMOVE` when gone,
//!    one `UPDATE` per differing facet (parameters, publish, subscribe)
//! 2. channels only in the new document: `CREATE`
//! 3. one `UPDATE` for the message catalog if any message differs

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::document::{Channel, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Create,
    Update,
    Remove,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "CREATE"),
            Self::Update => write!(f, "UPDATE"),
            Self::Remove => write!(f, "REMOVE"),
        }
    }
}

/// Part of a channel (or the document) an update refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    Parameters,
    Publish,
    Subscribe,
    Messages,
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parameters => "parameters",
            Self::Publish => "publish",
            Self::Subscribe => "subscribe",
            Self::Messages => "messages",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeAction {
    pub action: ChangeType,
    /// Channel name, or `components.messages`
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet: Option<Facet>,
    pub details: String,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.target)?;
        if let Some(facet) = self.facet {
            write!(f, " ({facet})")?;
        }
        if !self.details.is_empty() {
            write!(f, ": {}", self.details)?;
        }
        Ok(())
    }
}

/// Compare two documents
pub fn diff(existing: &Document, new: &Document) -> Vec<ChangeAction> {
    let mut actions = Vec::new();

    for (name, before) in &existing.channels {
        match new.channels.get(name) {
            None => actions.push(ChangeAction {
                action: ChangeType::Remove,
                target: name.clone(),
                facet: None,
                details: "channel no longer declared".to_string(),
            }),
            Some(after) => actions.extend(channel_updates(name, before, after)),
        }
    }

    for (name, channel) in &new.channels {
        if !existing.channels.contains_key(name) {
            let messages: Vec<_> = channel
                .published()
                .union(&channel.subscribed())
                .copied()
                .collect();
            actions.push(ChangeAction {
                action: ChangeType::Create,
                target: name.clone(),
                facet: None,
                details: if messages.is_empty() {
                    String::new()
                } else {
                    format!("carries {}", messages.join(", "))
                },
            });
        }
    }

    let before = &existing.components.messages;
    let after = &new.components.messages;
    if before != after {
        let names: BTreeSet<&str> = before.keys().chain(after.keys()).map(String::as_str).collect();
        let changed: Vec<_> = names
            .into_iter()
            .filter(|name| before.get(*name) != after.get(*name))
            .collect();
        actions.push(ChangeAction {
            action: ChangeType::Update,
            target: "components.messages".to_string(),
            facet: Some(Facet::Messages),
            details: format!("changed: {}", changed.join(", ")),
        });
    }

    log::debug!("Document diff produced {} actions", actions.len());
    actions
}

fn channel_updates(name: &str, before: &Channel, after: &Channel) -> Vec<ChangeAction> {
    let mut updates = Vec::new();
    let mut update = |facet, details: String| {
        updates.push(ChangeAction {
            action: ChangeType::Update,
            target: name.to_string(),
            facet: Some(facet),
            details,
        });
    };

    if before.parameters != after.parameters {
        let names: BTreeSet<&str> = before
            .parameters
            .keys()
            .chain(after.parameters.keys())
            .map(String::as_str)
            .collect();
        let changed: Vec<_> = names
            .into_iter()
            .filter(|p| before.parameters.get(*p) != after.parameters.get(*p))
            .collect();
        update(Facet::Parameters, format!("changed: {}", changed.join(", ")));
    }

    let (old, new) = (before.published(), after.published());
    if old != new {
        update(Facet::Publish, set_change(&old, &new));
    }

    let (old, new) = (before.subscribed(), after.subscribed());
    if old != new {
        update(Facet::Subscribe, set_change(&old, &new));
    }

    updates
}

fn set_change(old: &BTreeSet<&str>, new: &BTreeSet<&str>) -> String {
    let added: Vec<_> = new.difference(old).copied().collect();
    let removed: Vec<_> = old.difference(new).copied().collect();
    let mut parts = Vec::new();
    if !added.is_empty() {
        parts.push(format!("+{}", added.join(", +")));
    }
    if !removed.is_empty() {
        parts.push(format!("-{}", removed.join(", -")));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::sample;
    use crate::document::{Operation, Parameter};
    use serde_json::json;

    #[test]
    fn test_identical_documents_have_no_actions() {
        let doc = sample();
        assert!(diff(&doc, &doc).is_empty());
        assert!(diff(&Document::default(), &Document::default()).is_empty());
    }

    #[test]
    fn test_removed_channel_yields_single_remove() {
        let existing = sample();
        let mut new = existing.clone();
        new.channels.remove("orders/cancelled");

        let actions = diff(&existing, &new);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action, ChangeType::Remove);
        assert_eq!(actions[0].target, "orders/cancelled");
    }

    #[test]
    fn test_new_channel_yields_create_after_existing_actions() {
        let existing = sample();
        let mut new = existing.clone();
        new.channels.remove("orders/cancelled");
        new.channels.insert(
            "orders/shipped".to_string(),
            Channel {
                publish: Some(Operation {
                    messages: vec!["OrderShipped".to_string()],
                }),
                ..Default::default()
            },
        );

        let actions = diff(&existing, &new);
        let kinds: Vec<_> = actions.iter().map(|a| a.action).collect();
        assert_eq!(kinds, vec![ChangeType::Remove, ChangeType::Create]);
        assert_eq!(actions[1].target, "orders/shipped");
        assert_eq!(actions[1].details, "carries OrderShipped");
    }

    #[test]
    fn test_one_update_per_differing_facet() {
        let existing = sample();
        let mut new = existing.clone();
        let channel = new.channels.get_mut("orders/{region}/created").unwrap();
        channel.parameters.insert(
            "tenant".to_string(),
            Parameter {
                description: Some("Tenant id".to_string()),
                ..Default::default()
            },
        );
        channel.subscribe = Some(Operation {
            messages: vec!["OrderCreated".to_string()],
        });

        let actions = diff(&existing, &new);
        let facets: Vec<_> = actions.iter().map(|a| a.facet).collect();
        assert_eq!(facets, vec![Some(Facet::Parameters), Some(Facet::Subscribe)]);
        assert!(actions.iter().all(|a| a.action == ChangeType::Update));
        assert_eq!(actions[0].details, "changed: tenant");
        assert_eq!(actions[1].details, "+OrderCreated");
    }

    #[test]
    fn test_operation_message_order_is_ignored() {
        let mut existing = Document::default();
        existing.channels.insert(
            "c".to_string(),
            Channel {
                publish: Some(Operation {
                    messages: vec!["A".to_string(), "B".to_string()],
                }),
                ..Default::default()
            },
        );
        let mut new = existing.clone();
        new.channels.get_mut("c").unwrap().publish = Some(Operation {
            messages: vec!["B".to_string(), "A".to_string()],
        });

        assert!(diff(&existing, &new).is_empty());
    }

    #[test]
    fn test_message_catalog_change_is_final_update() {
        let existing = sample();
        let mut new = existing.clone();
        new.components
            .messages
            .get_mut("OrderCancelled")
            .unwrap()
            .payload = Some(json!({"type": "object", "required": ["id"]}));
        new.channels.remove("orders/cancelled");

        let actions = diff(&existing, &new);
        assert_eq!(actions.len(), 2);
        let last = actions.last().unwrap();
        assert_eq!(last.action, ChangeType::Update);
        assert_eq!(last.facet, Some(Facet::Messages));
        assert_eq!(last.details, "changed: OrderCancelled");
    }

    #[test]
    fn test_action_display_and_json() {
        let action = ChangeAction {
            action: ChangeType::Update,
            target: "orders/cancelled".to_string(),
            facet: Some(Facet::Publish),
            details: "+A".to_string(),
        };
        assert_eq!(action.to_string(), "UPDATE orders/cancelled (publish): +A");

        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["action"], "UPDATE");
        assert_eq!(value["facet"], "publish");
    }
}
