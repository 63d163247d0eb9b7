//! In-memory host scene
//!
//! A complete [`SceneHost`] backed by plain data: shared definitions,
//! instance paths, layers, selection and snapshot-based undoable operations.
//! Scenes are stored as RON files, like editor projects.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::traits::{
    DefinitionId, DefinitionInfo, EntityId, EntityInfo, EntityKind, HostError, HostResult,
    LayerInfo, ModelInfo, PartAttributes, SceneHost,
};
use crate::constants::DEFAULT_LAYER;

/// Entity as stored in a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub kind: EntityKind,
    #[serde(default)]
    pub name: String,
    pub definition: DefinitionId,
    #[serde(default = "default_layer")]
    pub layer: String,
    #[serde(default = "default_true")]
    pub visible: bool,
}

/// Definition as stored in a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionRecord {
    pub name: String,
    /// Owned entities, in native order
    #[serde(default)]
    pub entities: Vec<EntityId>,
    /// Cutlist attributes (parts only)
    #[serde(default)]
    pub part: Option<PartAttributes>,
}

fn default_layer() -> String {
    DEFAULT_LAYER.to_string()
}

fn default_true() -> bool {
    true
}

/// One host document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneModel {
    pub filename: String,
    pub model_name: String,
    /// Top-level entities, in native order
    #[serde(default)]
    pub root: Vec<EntityId>,
    #[serde(default)]
    pub entities: BTreeMap<EntityId, EntityRecord>,
    #[serde(default)]
    pub definitions: BTreeMap<DefinitionId, DefinitionRecord>,
    #[serde(default)]
    pub layers: Vec<LayerInfo>,
    #[serde(default)]
    pub selection: Vec<EntityId>,
    /// Path of the edited context
    #[serde(default)]
    pub active_path: Vec<EntityId>,
    #[serde(default)]
    next_id: u64,
}

impl SceneModel {
    /// Create an empty model with the default layer
    pub fn new(filename: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            model_name: model_name.into(),
            root: Vec::new(),
            entities: BTreeMap::new(),
            definitions: BTreeMap::new(),
            layers: vec![LayerInfo::new(DEFAULT_LAYER, [255, 255, 255])],
            selection: Vec::new(),
            active_path: Vec::new(),
            next_id: 1,
        }
    }

    /// Next free persistent id (shared by entities and definitions)
    fn allocate_id(&mut self) -> u64 {
        let max_entity = self.entities.last_key_value().map_or(0, |(id, _)| id.0);
        let max_definition = self.definitions.last_key_value().map_or(0, |(id, _)| id.0);
        let id = self.next_id.max(max_entity + 1).max(max_definition + 1);
        self.next_id = id + 1;
        id
    }

    // ============== Building ==============

    /// Add a layer
    pub fn add_layer(&mut self, layer: LayerInfo) {
        self.layers.push(layer);
    }

    /// Add a definition
    pub fn add_definition(
        &mut self,
        name: impl Into<String>,
        part: Option<PartAttributes>,
    ) -> DefinitionId {
        let id = DefinitionId(self.allocate_id());
        self.definitions.insert(
            id,
            DefinitionRecord {
                name: name.into(),
                entities: Vec::new(),
                part,
            },
        );
        id
    }

    /// Place an entity inside `owner` (None = model level)
    pub fn add_entity(
        &mut self,
        owner: Option<DefinitionId>,
        kind: EntityKind,
        name: impl Into<String>,
        definition: DefinitionId,
    ) -> HostResult<EntityId> {
        if !self.definitions.contains_key(&definition) {
            return Err(HostError::DefinitionNotFound(definition));
        }
        // Validate the container before allocating
        self.container_mut(owner)?;

        let id = EntityId(self.allocate_id());
        self.entities.insert(
            id,
            EntityRecord {
                kind,
                name: name.into(),
                definition,
                layer: default_layer(),
                visible: true,
            },
        );
        self.container_mut(owner)?.push(id);
        Ok(id)
    }

    /// Place a component instance of `definition`
    pub fn add_instance(
        &mut self,
        owner: Option<DefinitionId>,
        name: impl Into<String>,
        definition: DefinitionId,
    ) -> HostResult<EntityId> {
        self.add_entity(owner, EntityKind::ComponentInstance, name, definition)
    }

    /// Add a group with its own private definition
    pub fn add_group(
        &mut self,
        owner: Option<DefinitionId>,
        name: impl Into<String>,
    ) -> HostResult<(EntityId, DefinitionId)> {
        self.add_container(owner, EntityKind::Group, name.into())
    }

    /// Add a folder with its own private definition
    pub fn add_folder(
        &mut self,
        owner: Option<DefinitionId>,
        name: impl Into<String>,
    ) -> HostResult<(EntityId, DefinitionId)> {
        self.add_container(owner, EntityKind::Folder, name.into())
    }

    fn add_container(
        &mut self,
        owner: Option<DefinitionId>,
        kind: EntityKind,
        name: String,
    ) -> HostResult<(EntityId, DefinitionId)> {
        let definition_name = format!("{:?}#{}", kind, self.definitions.len() + 1);
        let definition = self.add_definition(definition_name, None);
        let entity = self.add_entity(owner, kind, name, definition)?;
        Ok((entity, definition))
    }

    /// Remove an entity from its container (children of its definition stay)
    pub fn erase_entity(&mut self, id: EntityId) -> HostResult<EntityRecord> {
        let record = self
            .entities
            .remove(&id)
            .ok_or(HostError::EntityNotFound(id))?;
        self.root.retain(|e| *e != id);
        for definition in self.definitions.values_mut() {
            definition.entities.retain(|e| *e != id);
        }
        self.selection.retain(|e| *e != id);
        Ok(record)
    }

    // ============== Queries ==============

    /// Get an entity record
    pub fn entity_record(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&id)
    }

    /// Get a mutable entity record
    pub fn entity_record_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.entities.get_mut(&id)
    }

    /// Get a definition record
    pub fn definition_record(&self, id: DefinitionId) -> Option<&DefinitionRecord> {
        self.definitions.get(&id)
    }

    /// Get a mutable definition record
    pub fn definition_record_mut(&mut self, id: DefinitionId) -> Option<&mut DefinitionRecord> {
        self.definitions.get_mut(&id)
    }

    /// Find definitions by name
    pub fn definitions_named(&self, name: &str) -> Vec<DefinitionId> {
        self.definitions
            .iter()
            .filter(|(_, d)| d.name == name)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of entities referencing a definition
    pub fn count_instances(&self, definition: DefinitionId) -> usize {
        self.entities
            .values()
            .filter(|e| e.definition == definition)
            .count()
    }

    /// Resolve a path of ownership steps
    pub fn resolve(&self, path: &[EntityId]) -> Option<EntityId> {
        let (first, rest) = path.split_first()?;
        if !self.root.contains(first) {
            return None;
        }
        let mut current = *first;
        for step in rest {
            let definition = self.entities.get(&current)?.definition;
            if !self.definitions.get(&definition)?.entities.contains(step) {
                return None;
            }
            current = *step;
        }
        self.entities.contains_key(&current).then_some(current)
    }

    fn container_mut(&mut self, owner: Option<DefinitionId>) -> HostResult<&mut Vec<EntityId>> {
        match owner {
            None => Ok(&mut self.root),
            Some(id) => self
                .definitions
                .get_mut(&id)
                .map(|d| &mut d.entities)
                .ok_or(HostError::DefinitionNotFound(id)),
        }
    }

    /// Copy an entity record under a new id (not placed in any container)
    fn duplicate_entity(&mut self, id: EntityId) -> HostResult<EntityId> {
        let record = self
            .entities
            .get(&id)
            .cloned()
            .ok_or(HostError::EntityNotFound(id))?;
        let copy = EntityId(self.allocate_id());
        self.entities.insert(copy, record);
        Ok(copy)
    }

    fn unique_definition_name(&self, base: &str) -> String {
        let base = base.split('#').next().unwrap_or(base);
        (1..)
            .map(|n| format!("{}#{}", base, n))
            .find(|candidate| self.definitions.values().all(|d| &d.name != candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Delete a definition and the entities it owns, cascading to
    /// definitions that end up unreferenced
    fn purge_definition(&mut self, id: DefinitionId) {
        let Some(record) = self.definitions.remove(&id) else {
            return;
        };
        for entity in record.entities {
            if let Some(child) = self.entities.remove(&entity)
                && self.count_instances(child.definition) == 0
            {
                self.purge_definition(child.definition);
            }
        }
    }
}

/// Host scene held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    scene: Option<SceneModel>,
    /// Open operation: name and snapshot taken when it started
    pending: Option<(String, Option<SceneModel>)>,
    /// Committed operations: name and snapshot taken before each
    undo_stack: Vec<(String, Option<SceneModel>)>,
}

impl MemoryScene {
    /// Create a host with an open document
    pub fn new(scene: SceneModel) -> Self {
        Self {
            scene: Some(scene),
            ..Self::default()
        }
    }

    /// Create a host with no open document
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a scene from a RON file
    pub fn load(path: impl AsRef<Path>) -> HostResult<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| HostError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Parse a scene from RON text
    pub fn from_ron_str(content: &str) -> HostResult<Self> {
        let scene: SceneModel =
            ron::from_str(content).map_err(|e| HostError::Deserialize(e.to_string()))?;
        Ok(Self::new(scene))
    }

    /// Save the open scene to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> HostResult<()> {
        let content = self.to_ron_string()?;
        std::fs::write(path.as_ref(), content).map_err(|e| HostError::Io(e.to_string()))
    }

    /// Serialize the open scene to RON text
    pub fn to_ron_string(&self) -> HostResult<String> {
        let scene = self.checked()?;
        ron::ser::to_string_pretty(scene, ron::ser::PrettyConfig::default())
            .map_err(|e| HostError::Serialize(e.to_string()))
    }

    /// The open scene
    pub fn scene(&self) -> Option<&SceneModel> {
        self.scene.as_ref()
    }

    /// The open scene (mutable, bypasses operations)
    pub fn scene_mut(&mut self) -> Option<&mut SceneModel> {
        self.scene.as_mut()
    }

    /// Replace the open document
    pub fn open(&mut self, scene: SceneModel) {
        self.scene = Some(scene);
        self.pending = None;
        self.undo_stack.clear();
    }

    /// Close the open document
    pub fn close(&mut self) -> Option<SceneModel> {
        self.pending = None;
        self.undo_stack.clear();
        self.scene.take()
    }

    /// Whether an operation is open
    pub fn is_operation_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Names of committed operations, oldest first
    pub fn undo_names(&self) -> Vec<&str> {
        self.undo_stack.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Revert the last committed operation, returning its name
    pub fn undo(&mut self) -> HostResult<String> {
        if let Some((name, _)) = &self.pending {
            return Err(HostError::OperationInProgress(name.clone()));
        }
        let (name, snapshot) = self.undo_stack.pop().ok_or(HostError::NothingToUndo)?;
        self.scene = snapshot;
        tracing::info!("Undid operation '{}'", name);
        Ok(name)
    }

    fn checked(&self) -> HostResult<&SceneModel> {
        self.scene.as_ref().ok_or(HostError::NoModel)
    }

    fn checked_mut(&mut self) -> HostResult<&mut SceneModel> {
        self.scene.as_mut().ok_or(HostError::NoModel)
    }

    fn entity_mut(&mut self, id: EntityId) -> HostResult<&mut EntityRecord> {
        self.checked_mut()?
            .entities
            .get_mut(&id)
            .ok_or(HostError::EntityNotFound(id))
    }
}

impl SceneHost for MemoryScene {
    fn model_info(&self) -> Option<ModelInfo> {
        self.scene.as_ref().map(|s| ModelInfo {
            filename: s.filename.clone(),
            model_name: s.model_name.clone(),
        })
    }

    fn root_entities(&self) -> HostResult<Vec<EntityId>> {
        Ok(self.checked()?.root.clone())
    }

    fn entity(&self, id: EntityId) -> Option<EntityInfo> {
        let record = self.scene.as_ref()?.entities.get(&id)?;
        Some(EntityInfo {
            id,
            kind: record.kind,
            name: record.name.clone(),
            definition: record.definition,
            layer: record.layer.clone(),
            visible: record.visible,
        })
    }

    fn children(&self, id: EntityId) -> HostResult<Vec<EntityId>> {
        let scene = self.checked()?;
        let record = scene
            .entities
            .get(&id)
            .ok_or(HostError::EntityNotFound(id))?;
        scene
            .definitions
            .get(&record.definition)
            .map(|d| d.entities.clone())
            .ok_or(HostError::DefinitionNotFound(record.definition))
    }

    fn definition(&self, id: DefinitionId) -> Option<DefinitionInfo> {
        let scene = self.scene.as_ref()?;
        let record = scene.definitions.get(&id)?;
        Some(DefinitionInfo {
            id,
            name: record.name.clone(),
            instance_count: scene.count_instances(id),
            part: record.part.clone(),
        })
    }

    fn layers(&self) -> HostResult<Vec<LayerInfo>> {
        Ok(self.checked()?.layers.clone())
    }

    fn selection(&self) -> Vec<EntityId> {
        self.scene
            .as_ref()
            .map(|s| s.selection.clone())
            .unwrap_or_default()
    }

    fn active_path(&self) -> Vec<EntityId> {
        self.scene
            .as_ref()
            .map(|s| s.active_path.clone())
            .unwrap_or_default()
    }

    fn resolve_path(&self, path: &[EntityId]) -> Option<EntityId> {
        self.scene.as_ref()?.resolve(path)
    }

    fn start_operation(&mut self, name: &str) -> HostResult<()> {
        if let Some((open, _)) = &self.pending {
            return Err(HostError::OperationInProgress(open.clone()));
        }
        self.pending = Some((name.to_string(), self.scene.clone()));
        Ok(())
    }

    fn commit_operation(&mut self) -> HostResult<()> {
        let operation = self.pending.take().ok_or(HostError::NoOperation)?;
        self.undo_stack.push(operation);
        Ok(())
    }

    fn abort_operation(&mut self) -> HostResult<()> {
        let (name, snapshot) = self.pending.take().ok_or(HostError::NoOperation)?;
        self.scene = snapshot;
        tracing::debug!("Aborted operation '{}'", name);
        Ok(())
    }

    fn set_entity_name(&mut self, id: EntityId, name: &str) -> HostResult<()> {
        self.entity_mut(id)?.name = name.to_string();
        Ok(())
    }

    fn set_entity_visible(&mut self, id: EntityId, visible: bool) -> HostResult<()> {
        self.entity_mut(id)?.visible = visible;
        Ok(())
    }

    fn explode(&mut self, path: &[EntityId]) -> HostResult<Vec<(EntityId, EntityId)>> {
        let scene = self.checked_mut()?;
        let target = scene.resolve(path).ok_or(HostError::InvalidPath)?;
        let owner = match path {
            [.., parent, _] => Some(
                scene
                    .entities
                    .get(parent)
                    .ok_or(HostError::EntityNotFound(*parent))?
                    .definition,
            ),
            _ => None,
        };
        let record = scene
            .entities
            .get(&target)
            .cloned()
            .ok_or(HostError::EntityNotFound(target))?;
        let children = scene
            .definitions
            .get(&record.definition)
            .map(|d| d.entities.clone())
            .ok_or(HostError::DefinitionNotFound(record.definition))?;

        let mut moved = Vec::with_capacity(children.len());
        for child in children {
            moved.push((child, scene.duplicate_entity(child)?));
        }

        let container = scene.container_mut(owner)?;
        let position = container
            .iter()
            .position(|e| *e == target)
            .ok_or(HostError::InvalidPath)?;
        container.splice(position..=position, moved.iter().map(|(_, copy)| *copy));

        scene.entities.remove(&target);
        scene.selection.retain(|e| *e != target);
        if scene.count_instances(record.definition) == 0 {
            scene.purge_definition(record.definition);
        }
        Ok(moved)
    }

    fn make_unique(&mut self, id: EntityId) -> HostResult<DefinitionId> {
        let scene = self.checked_mut()?;
        let record = scene
            .entities
            .get(&id)
            .cloned()
            .ok_or(HostError::EntityNotFound(id))?;
        let source = scene
            .definitions
            .get(&record.definition)
            .cloned()
            .ok_or(HostError::DefinitionNotFound(record.definition))?;

        let mut entities = Vec::with_capacity(source.entities.len());
        for child in &source.entities {
            entities.push(scene.duplicate_entity(*child)?);
        }
        let name = scene.unique_definition_name(&source.name);
        let unique = DefinitionId(scene.allocate_id());
        scene.definitions.insert(
            unique,
            DefinitionRecord {
                name,
                entities,
                part: source.part,
            },
        );
        if let Some(entity) = scene.entities.get_mut(&id) {
            entity.definition = unique;
        }
        Ok(unique)
    }

    fn set_entity_definition(&mut self, id: EntityId, definition: DefinitionId) -> HostResult<()> {
        if !self.checked()?.definitions.contains_key(&definition) {
            return Err(HostError::DefinitionNotFound(definition));
        }
        self.entity_mut(id)?.definition = definition;
        Ok(())
    }

    fn set_definition_name(&mut self, id: DefinitionId, name: &str) -> HostResult<()> {
        let record = self
            .checked_mut()?
            .definitions
            .get_mut(&id)
            .ok_or(HostError::DefinitionNotFound(id))?;
        record.name = name.to_string();
        Ok(())
    }

    fn remove_definition(&mut self, id: DefinitionId) -> HostResult<()> {
        let scene = self.checked_mut()?;
        if !scene.definitions.contains_key(&id) {
            return Err(HostError::DefinitionNotFound(id));
        }
        let count = scene.count_instances(id);
        if count > 0 {
            return Err(HostError::DefinitionInUse(id, count));
        }
        scene.purge_definition(id);
        Ok(())
    }
}
