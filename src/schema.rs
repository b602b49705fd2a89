//! JSON schema tree shared by generation, composition and output

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Draft used for the `$schema` keyword of every chart root
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// A single JSON schema node.
///
/// Nodes own their `properties` and `items` outright. Embedding one chart's
/// schema into another always clones the subtree, so edits made to a parent
/// never reach the dependency's own output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub type_: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    /// Property name -> subschema, kept sorted for stable output
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
}

impl Schema {
    /// A node carrying a single type tag
    pub fn typed(tag: &str) -> Self {
        Self {
            type_: vec![tag.to_string()],
            ..Self::default()
        }
    }

    /// An empty object node
    pub fn object() -> Self {
        Self::typed("object")
    }

    /// A boolean leaf
    pub fn boolean() -> Self {
        Self::typed("boolean")
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the node carries the given type tag
    pub fn has_type(&self, tag: &str) -> bool {
        self.type_.iter().any(|t| t == tag)
    }

    /// Clear `required` on this node and on every nested node.
    pub fn disable_required_properties(&mut self) {
        self.required.clear();
        for property in self.properties.values_mut() {
            property.disable_required_properties();
        }
        if let Some(items) = self.items.as_mut() {
            items.disable_required_properties();
        }
    }

    /// Look up a nested property by a path of property names
    pub fn property_at(&self, path: &[&str]) -> Option<&Schema> {
        let mut current = self;
        for key in path {
            current = current.properties.get(*key)?;
        }
        Some(current)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}
