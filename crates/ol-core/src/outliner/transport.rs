//! Transport form of a generated outliner
//!
//! This is the JSON document the panel renders. Field names are part of the
//! panel protocol.

use serde::{Deserialize, Serialize};

use crate::node::{NodeId, NodeType};

/// Layer entry of the available-layers catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableLayer {
    pub name: String,
    /// Enclosing layer folders, outermost first
    pub path: Vec<String>,
    /// Color as `#rrggbb`
    pub color: String,
}

/// Messages collected while generating
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub tips: Vec<String>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.tips.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    pub expanded: bool,
    pub visible: bool,
    pub selected: bool,
    pub active: bool,
    pub computed_visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    pub children: Vec<TransportNode>,
}

/// Root node plus the outliner-level data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportTree {
    #[serde(flatten)]
    pub root: TransportNode,
    pub available_layers: Vec<AvailableLayer>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub tips: Vec<String>,
    pub filename: String,
    pub model_name: String,
}

impl TransportTree {
    /// Depth-first lookup of a node by id
    pub fn find(&self, id: NodeId) -> Option<&TransportNode> {
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }
}
