//! Desired-state document
//!
//! The structured form of a parsed API document: named channels with
//! parameters and publish/subscribe operations, plus a catalog of named
//! messages. Maps are keyed by name and iterate in name order.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub info: Info,
    #[serde(default)]
    pub channels: BTreeMap<String, Channel>,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Target application domain
    #[serde(
        rename = "x-domain-name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub domain_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<Operation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: ParameterSchema,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

impl ParameterSchema {
    /// Enumerated values as strings (numbers and booleans are rendered)
    pub fn enum_values(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }
}

/// A publish or subscribe operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Names of the messages in `components.messages`
    #[serde(default)]
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub messages: BTreeMap<String, Message>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Channel {
    /// Message names of the publish operation
    pub fn published(&self) -> BTreeSet<&str> {
        operation_messages(self.publish.as_ref())
    }

    /// Message names of the subscribe operation
    pub fn subscribed(&self) -> BTreeSet<&str> {
        operation_messages(self.subscribe.as_ref())
    }

    /// Whether either operation carries the named message
    pub fn carries(&self, message: &str) -> bool {
        self.published().contains(message) || self.subscribed().contains(message)
    }
}

fn operation_messages(operation: Option<&Operation>) -> BTreeSet<&str> {
    operation
        .map(|op| op.messages.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

impl Document {
    /// Load a document from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid document {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Document is not valid JSON of the expected shape")
    }

    /// First channel (in name order) that publishes or subscribes a message
    pub fn channel_for(&self, message: &str) -> Option<&str> {
        self.channels
            .iter()
            .find(|(_, channel)| channel.carries(message))
            .map(|(name, _)| name.as_str())
    }
}
