//! Outliner nodes
//!
//! A node mirrors one host entity (or the model itself for the root). Nodes
//! reference the host through a path of persistent entity ids rather than a
//! live handle, so a stale node can be detected by resolving its path again.

mod store;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{NODE_ID_NAMESPACE, PATH_SEPARATOR};
use crate::host::{DefinitionId, EntityId, EntityKind};

pub use store::{NodeStore, StoreError};

/// Stable node identifier (UUID v5 of the host path)
pub type NodeId = Uuid;

/// Classification of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// The model itself
    Root,
    Folder,
    Group,
    /// Component instance containing further containers
    ComponentInstance,
    /// Component instance with no nested containers
    Part,
}

impl NodeType {
    /// Classify a host entity
    ///
    /// `has_containers` tells whether the entity's definition owns further
    /// groups, folders or instances.
    pub fn classify(kind: EntityKind, has_containers: bool) -> Self {
        match kind {
            EntityKind::Folder => Self::Folder,
            EntityKind::Group => Self::Group,
            EntityKind::ComponentInstance if has_containers => Self::ComponentInstance,
            EntityKind::ComponentInstance => Self::Part,
        }
    }

    /// Whether the display name falls back to the definition name
    pub fn is_instance(&self) -> bool {
        matches!(self, Self::ComponentInstance | Self::Part)
    }
}

/// UI and host state flags of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeFlags {
    pub expanded: bool,
    /// Own visibility of the entity
    pub visible: bool,
    pub selected: bool,
    /// On the path to the edited context
    pub active: bool,
    /// Own visibility, layer visibility and parent visibility combined
    pub computed_visible: bool,
}

/// A node of the outliner tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    /// Display name
    pub name: String,
    /// Ownership steps from the model to the entity (empty for the root)
    pub path: Vec<EntityId>,
    /// Layer of the entity (None for the root)
    pub layer: Option<String>,
    /// Definition referenced by the entity (None for the root)
    pub definition: Option<DefinitionId>,
    /// Visibility of the entity's layer
    pub layer_visible: bool,
    pub flags: NodeFlags,
    /// Ordered child ids
    pub children: Vec<NodeId>,
    /// Parent id (None for the root)
    pub parent: Option<NodeId>,
}

impl Node {
    /// Create the root node of a model
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            id: Self::id_for_path(&[]),
            node_type: NodeType::Root,
            name: name.into(),
            path: Vec::new(),
            layer: None,
            definition: None,
            layer_visible: true,
            flags: NodeFlags {
                expanded: true,
                visible: true,
                selected: false,
                active: true,
                computed_visible: true,
            },
            children: Vec::new(),
            parent: None,
        }
    }

    /// Derive the stable id of the node designating `path`
    pub fn id_for_path(path: &[EntityId]) -> NodeId {
        Uuid::new_v5(&NODE_ID_NAMESPACE, serialize_path(path).as_bytes())
    }

    /// Persistent id of the designated entity (None for the root)
    pub fn entity_id(&self) -> Option<EntityId> {
        self.path.last().copied()
    }

    pub fn is_root(&self) -> bool {
        self.node_type == NodeType::Root
    }
}

/// Serialize a host path as persistent ids joined by the path separator
pub fn serialize_path(path: &[EntityId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(&PATH_SEPARATOR.to_string())
}
