//! Host scene trait definitions
//!
//! These traits define the surface the outliner consumes from the host
//! application: reading the scene graph and applying undoable mutations.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persistent identifier of a host entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistent identifier of a shared definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionId(pub u64);

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a container entity in the host scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Pure organizational container
    Folder,
    /// Group (owns a private definition)
    Group,
    /// Placed occurrence of a shared definition
    ComponentInstance,
}

/// Read-only view of a host entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Instance name (may be empty)
    pub name: String,
    pub definition: DefinitionId,
    pub layer: String,
    /// Own visibility flag (ignores layer and ancestors)
    pub visible: bool,
}

/// Read-only view of a shared definition
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionInfo {
    pub id: DefinitionId,
    pub name: String,
    /// Number of live entities referencing this definition
    pub instance_count: usize,
    /// Cutlist attributes (None if the definition is not a part)
    pub part: Option<PartAttributes>,
}

/// Layer (tag) of the host model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub name: String,
    /// Names of the enclosing layer folders, outermost first
    #[serde(default)]
    pub folders: Vec<String>,
    /// Display color (RGB)
    pub color: [u8; 3],
    #[serde(default = "default_true")]
    pub visible: bool,
}

impl LayerInfo {
    pub fn new(name: impl Into<String>, color: [u8; 3]) -> Self {
        Self {
            name: name.into(),
            folders: Vec::new(),
            color,
            visible: true,
        }
    }

    /// Color as `#rrggbb`
    pub fn color_hex(&self) -> String {
        let [r, g, b] = self.color;
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

fn default_true() -> bool {
    true
}

/// Source identifiers of the active model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub filename: String,
    pub model_name: String,
}

/// Material assigned to a part
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialAttributes {
    pub name: String,
    /// Material type (solid wood, sheet good, dimensional, ...)
    pub kind: String,
    pub description: String,
    pub url: String,
}

/// Edge band or veneer applied to one side of a part
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandAttributes {
    pub material: String,
    pub thickness: f32,
    pub width: f32,
}

/// Edge bands keyed by part side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeBands {
    pub ymin: Option<BandAttributes>,
    pub ymax: Option<BandAttributes>,
    pub xmin: Option<BandAttributes>,
    pub xmax: Option<BandAttributes>,
}

/// Veneers keyed by part face
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Veneers {
    pub zmin: Option<BandAttributes>,
    pub zmax: Option<BandAttributes>,
}

/// Cutlist attributes of a part definition
///
/// Dimensions are computed by the cutlist engine and stored on the
/// definition; lengths are millimeters, areas square meters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartAttributes {
    pub description: String,
    pub url: String,
    pub tags: Vec<String>,
    /// Bounding box size (length, width, thickness)
    pub size: Vec3,
    /// Cutting size (length, width, thickness)
    pub cutting_size: Vec3,
    pub edge_cutting_length: f32,
    pub edge_cutting_width: f32,
    pub final_area: f32,
    pub material: Option<MaterialAttributes>,
    pub edges: EdgeBands,
    pub veneers: Veneers,
}

/// Error type for host operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("No active model")]
    NoModel,
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),
    #[error("Definition not found: {0}")]
    DefinitionNotFound(DefinitionId),
    #[error("Definition {0} is still used by {1} instance(s)")]
    DefinitionInUse(DefinitionId, usize),
    #[error("Path does not resolve to a live entity")]
    InvalidPath,
    #[error("No operation in progress")]
    NoOperation,
    #[error("Operation already in progress: {0}")]
    OperationInProgress(String),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;

/// Query and mutation surface of the host scene
///
/// Mutations are expected to run between `start_operation` and
/// `commit_operation`; `abort_operation` restores the scene to its state at
/// `start_operation`.
pub trait SceneHost {
    /// Identifiers of the active model (None if no document is open)
    fn model_info(&self) -> Option<ModelInfo>;

    /// Top-level entities of the model, in native order
    fn root_entities(&self) -> HostResult<Vec<EntityId>>;

    /// Look up a live entity
    fn entity(&self, id: EntityId) -> Option<EntityInfo>;

    /// Entities owned by the definition of `id`, in native order
    fn children(&self, id: EntityId) -> HostResult<Vec<EntityId>>;

    /// Look up a definition
    fn definition(&self, id: DefinitionId) -> Option<DefinitionInfo>;

    /// Layers of the model
    fn layers(&self) -> HostResult<Vec<LayerInfo>>;

    /// Currently selected entities
    fn selection(&self) -> Vec<EntityId>;

    /// Path of the currently edited context (empty at model level)
    fn active_path(&self) -> Vec<EntityId>;

    /// Resolve a path of ownership steps to the live entity it designates
    fn resolve_path(&self, path: &[EntityId]) -> Option<EntityId> {
        let (first, rest) = path.split_first()?;
        if !self.root_entities().ok()?.contains(first) {
            return None;
        }
        let mut current = *first;
        for step in rest {
            if !self.children(current).ok()?.contains(step) {
                return None;
            }
            current = *step;
        }
        self.entity(current).map(|e| e.id)
    }

    // ============== Operations ==============

    /// Open a named undoable operation
    fn start_operation(&mut self, name: &str) -> HostResult<()>;

    /// Commit the open operation
    fn commit_operation(&mut self) -> HostResult<()>;

    /// Roll back the open operation
    fn abort_operation(&mut self) -> HostResult<()>;

    // ============== Mutations ==============

    /// Set the instance name of an entity
    fn set_entity_name(&mut self, id: EntityId, name: &str) -> HostResult<()>;

    /// Set the own visibility flag of an entity
    fn set_entity_visible(&mut self, id: EntityId, visible: bool) -> HostResult<()>;

    /// Dissolve the entity at `path`, moving copies of its children into its
    /// container at its former position
    ///
    /// Returns `(old child, new child)` pairs in their new order.
    fn explode(&mut self, path: &[EntityId]) -> HostResult<Vec<(EntityId, EntityId)>>;

    /// Detach an instance onto a fresh copy of its definition
    fn make_unique(&mut self, id: EntityId) -> HostResult<DefinitionId>;

    /// Point an instance at another definition
    fn set_entity_definition(&mut self, id: EntityId, definition: DefinitionId) -> HostResult<()>;

    /// Rename a definition
    fn set_definition_name(&mut self, id: DefinitionId, name: &str) -> HostResult<()>;

    /// Delete a definition that no instance references anymore
    fn remove_definition(&mut self, id: DefinitionId) -> HostResult<()>;
}
