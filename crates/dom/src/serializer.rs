//! DOM Serializer - diagnostic dumps of a live subtree
//!
//! This module handles:
//! - Indented markup output for logs and assertions
//! - Serde snapshots of a subtree (JSON via serde_json)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::*;
use crate::utils;

/// Serializer configuration
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    pub include_attributes: Vec<String>,
    pub max_text_length: usize,
    /// Render empty text nodes (range markers, mostly) as `""`
    pub show_empty_text: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            include_attributes: DEFAULT_INCLUDE_ATTRIBUTES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_text_length: 200,
            show_empty_text: false,
        }
    }
}

/// Owned, serializable copy of a subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub node_id: NodeId,
    pub node_type: NodeType,
    pub node_name: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub node_value: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<NodeSnapshot>,
}

/// DOM Tree Serializer
pub struct DomSerializer {
    config: SerializerConfig,
}

impl DomSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Serialize the subtree rooted at `node_id` as indented markup
    pub fn serialize(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(256);
        self.serialize_node(arena, node_id, 0, &mut output)?;
        Ok(output)
    }

    /// Serialize a run of sibling nodes, in the given order
    pub fn serialize_nodes(&self, arena: &DomArena, node_ids: &[NodeId]) -> Result<String> {
        let mut output = String::with_capacity(256);
        for &node_id in node_ids {
            self.serialize_node(arena, node_id, 0, &mut output)?;
        }
        Ok(output)
    }

    fn serialize_node(
        &self,
        arena: &DomArena,
        node_id: NodeId,
        depth: usize,
        output: &mut String,
    ) -> Result<()> {
        let node = arena.get(node_id)?;
        let indent = "  ".repeat(depth);

        match node.node_type {
            NodeType::Element => {
                output.push_str(&indent);
                output.push('<');
                output.push_str(&node.node_name);

                for attr_name in &self.config.include_attributes {
                    if let Some(attr_value) = node.attr(attr_name) {
                        output.push_str(&format!(" {}=\"{}\"", attr_name, attr_value));
                    }
                }

                output.push_str(">\n");

                for &child_id in &node.children_ids {
                    self.serialize_node(arena, child_id, depth + 1, output)?;
                }

                output.push_str(&indent);
                output.push_str("</");
                output.push_str(&node.node_name);
                output.push_str(">\n");
            }
            NodeType::Text => {
                let text = node.node_value.trim();
                if !text.is_empty() {
                    output.push_str(&indent);
                    output.push_str(&utils::cap_text_length(text, self.config.max_text_length));
                    output.push('\n');
                } else if self.config.show_empty_text {
                    output.push_str(&indent);
                    output.push_str("\"\"\n");
                }
            }
            NodeType::Comment => {
                output.push_str(&indent);
                output.push_str("<!--");
                output.push_str(&node.node_value);
                output.push_str("-->\n");
            }
            NodeType::Document | NodeType::DocumentFragment => {
                // Containers are transparent, only their children show
                for &child_id in &node.children_ids {
                    self.serialize_node(arena, child_id, depth, output)?;
                }
            }
        }

        Ok(())
    }

    /// Copy the subtree rooted at `node_id` into an owned snapshot
    pub fn snapshot(&self, arena: &DomArena, node_id: NodeId) -> Result<NodeSnapshot> {
        let node = arena.get(node_id)?;
        let children = node
            .children_ids
            .iter()
            .map(|&child_id| self.snapshot(arena, child_id))
            .collect::<Result<Vec<_>>>()?;

        Ok(NodeSnapshot {
            node_id,
            node_type: node.node_type,
            node_name: node.node_name.clone(),
            node_value: node.node_value.clone(),
            attributes: node
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            children,
        })
    }

    pub fn to_json(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot(arena, node_id)?)?)
    }
}

impl Default for DomSerializer {
    fn default() -> Self {
        Self::new()
    }
}
