//! Scene adapter: builds an outliner from the live host scene
//!
//! Traversal is depth-first and keeps the host's native child order. The
//! adapter only reads the host.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::config::OutlinerConfig;
use crate::constants::{
    ERROR_RECURSIVE_DEFINITION, TIP_EMPTY_MODEL, WARNING_DUPLICATE_ID, WARNING_MISSING_ENTITY,
};
use crate::error::{OutlinerError, OutlinerResult};
use crate::host::{EntityId, LayerInfo, SceneHost};
use crate::node::{Node, NodeFlags, NodeId, NodeStore, NodeType};
use crate::outliner::{AvailableLayer, Diagnostics, Outliner};

/// Builds [`Outliner`] snapshots from a host scene
pub struct SceneAdapter<'a> {
    host: &'a dyn SceneHost,
    config: &'a OutlinerConfig,
}

/// Per-generation state
struct BuildContext {
    store: NodeStore,
    diagnostics: Diagnostics,
    layer_visibility: HashMap<String, bool>,
    selection: HashSet<EntityId>,
    active_path: Vec<EntityId>,
}

impl<'a> SceneAdapter<'a> {
    pub fn new(host: &'a dyn SceneHost, config: &'a OutlinerConfig) -> Self {
        Self { host, config }
    }

    /// Generate a fresh outliner
    pub fn build(&self) -> OutlinerResult<Outliner> {
        let model = self.host.model_info().ok_or(OutlinerError::NoModel)?;
        let layers = self.host.layers()?;

        let mut ctx = BuildContext {
            store: NodeStore::new(Node::root(model.model_name.clone())),
            diagnostics: Diagnostics::default(),
            layer_visibility: layers.iter().map(|l| (l.name.clone(), l.visible)).collect(),
            selection: self.host.selection().into_iter().collect(),
            active_path: self.host.active_path(),
        };

        let entities = self.host.root_entities()?;
        if entities.is_empty() {
            ctx.diagnostics.tips.push(TIP_EMPTY_MODEL.to_string());
        }

        let root = ctx.store.root_id();
        for entity in entities {
            self.visit(&mut ctx, root, &[], entity, true)?;
        }

        tracing::debug!(
            "Generated outliner for '{}' with {} nodes",
            model.filename,
            ctx.store.node_count()
        );

        Ok(Outliner::new(
            ctx.store,
            layers.iter().map(available_layer).collect(),
            ctx.diagnostics,
            model.filename,
            model.model_name,
        ))
    }

    fn visit(
        &self,
        ctx: &mut BuildContext,
        parent: NodeId,
        parent_path: &[EntityId],
        entity_id: EntityId,
        parent_visible: bool,
    ) -> OutlinerResult<()> {
        if parent_path.contains(&entity_id) {
            tracing::warn!("Definition of entity {} contains itself, skipping", entity_id);
            push_once(&mut ctx.diagnostics.errors, ERROR_RECURSIVE_DEFINITION);
            return Ok(());
        }
        let Some(entity) = self.host.entity(entity_id) else {
            tracing::warn!("Entity {} is listed but does not exist", entity_id);
            push_once(&mut ctx.diagnostics.warnings, WARNING_MISSING_ENTITY);
            return Ok(());
        };

        let layer_visible = ctx
            .layer_visibility
            .get(&entity.layer)
            .copied()
            .unwrap_or(true);
        if !entity.visible && !self.config.include_hidden_entities {
            tracing::debug!("Skipping hidden entity {}", entity_id);
            return Ok(());
        }
        if !layer_visible && !self.config.include_hidden_layers {
            tracing::debug!("Skipping entity {} on hidden layer '{}'", entity_id, entity.layer);
            return Ok(());
        }

        let children = self.host.children(entity_id)?;
        let node_type = NodeType::classify(entity.kind, !children.is_empty());
        let name = if entity.name.is_empty() && node_type.is_instance() {
            self.host
                .definition(entity.definition)
                .map(|d| d.name)
                .unwrap_or_default()
        } else {
            entity.name.clone()
        };

        let mut path = parent_path.to_vec();
        path.push(entity_id);

        let mut id = Node::id_for_path(&path);
        if ctx.store.contains(id) {
            tracing::warn!("Node id collision for path {:?}, using a random id", path);
            push_once(&mut ctx.diagnostics.warnings, WARNING_DUPLICATE_ID);
            id = Uuid::new_v4();
        }

        let computed_visible = parent_visible && entity.visible && layer_visible;
        let node = Node {
            id,
            node_type,
            name,
            path: path.clone(),
            layer: Some(entity.layer),
            definition: Some(entity.definition),
            layer_visible,
            flags: NodeFlags {
                expanded: self.config.expand_all,
                visible: entity.visible,
                selected: parent_path == ctx.active_path.as_slice()
                    && ctx.selection.contains(&entity_id),
                active: ctx.active_path.starts_with(&path),
                computed_visible,
            },
            children: Vec::new(),
            parent: None,
        };
        let id = ctx.store.add_child(parent, node)?;

        for child in children {
            self.visit(ctx, id, &path, child, computed_visible)?;
        }
        Ok(())
    }
}

fn available_layer(layer: &LayerInfo) -> AvailableLayer {
    AvailableLayer {
        name: layer.name.clone(),
        path: layer.folders.clone(),
        color: layer.color_hex(),
    }
}

fn push_once(messages: &mut Vec<String>, code: &str) {
    if !messages.iter().any(|m| m == code) {
        messages.push(code.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fixtures::workshop;
    use crate::host::{MemoryScene, SceneModel};

    fn build(host: &dyn SceneHost, config: &OutlinerConfig) -> Outliner {
        SceneAdapter::new(host, config).build().unwrap()
    }

    #[test]
    fn test_no_model() {
        let host = MemoryScene::empty();
        let result = SceneAdapter::new(&host, &OutlinerConfig::default()).build();
        assert_eq!(result.err(), Some(OutlinerError::NoModel));
    }

    #[test]
    fn test_empty_model_tip() {
        let host = MemoryScene::new(SceneModel::new("Empty.skp", "Empty"));
        let outliner = build(&host, &OutlinerConfig::default());
        assert_eq!(outliner.node_count(), 1);
        assert_eq!(outliner.diagnostics().tips, vec![TIP_EMPTY_MODEL.to_string()]);
        assert!(outliner.root().flags.expanded);
        assert!(outliner.root().flags.active);
    }

    #[test]
    fn test_structure_and_names() {
        let w = workshop();
        let outliner = build(&w.scene, &OutlinerConfig::default());
        let root = outliner.root();

        assert_eq!(root.name, "Workshop");
        assert_eq!(root.children.len(), 3);
        assert_eq!(outliner.node_count(), 8);

        let group = outliner.store().get(root.children[0]).unwrap();
        assert_eq!(group.node_type, NodeType::Group);
        assert_eq!(group.path, vec![w.group_a]);
        let names: Vec<_> = group
            .children
            .iter()
            .map(|c| outliner.store().get(*c).unwrap().name.as_str())
            .collect();
        assert_eq!(names, ["A", "B"]);

        let drawer = outliner.store().get(root.children[2]).unwrap();
        assert_eq!(drawer.node_type, NodeType::ComponentInstance);
        assert_eq!(drawer.name, "Drawer");
        let front = outliner.store().get(drawer.children[0]).unwrap();
        assert_eq!(front.node_type, NodeType::Part);
        assert_eq!(front.name, "Front");
        assert_eq!(front.path, vec![w.drawer, w.front]);
        assert!(outliner.store().validate().is_ok());
    }

    #[test]
    fn test_ids_stable_across_generations() {
        let w = workshop();
        let first = build(&w.scene, &OutlinerConfig::default());
        let second = build(&w.scene, &OutlinerConfig::default());

        let first_ids = first.store().descendants_depth_first(first.root_id());
        let second_ids = second.store().descendants_depth_first(second.root_id());
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn test_hidden_layer_filtering() {
        let w = workshop();
        let listed = build(&w.scene, &OutlinerConfig::default());
        let shelf = listed.get_node(Node::id_for_path(&[w.shelf]), None).unwrap();
        assert!(shelf.flags.visible);
        assert!(!shelf.layer_visible);
        assert!(!shelf.flags.computed_visible);

        let config = OutlinerConfig {
            include_hidden_layers: false,
            ..Default::default()
        };
        let filtered = build(&w.scene, &config);
        assert!(filtered.get_node(Node::id_for_path(&[w.shelf]), None).is_none());
        assert_eq!(filtered.root().children.len(), 2);
    }

    #[test]
    fn test_hidden_entity_filtering() {
        let mut w = workshop();
        let scene = w.scene.scene_mut().unwrap();
        scene.entity_record_mut(w.group_a).unwrap().visible = false;

        let listed = build(&w.scene, &OutlinerConfig::default());
        let part_x = listed
            .get_node(Node::id_for_path(&[w.group_a, w.part_x]), None)
            .unwrap();
        assert!(part_x.flags.visible);
        assert!(!part_x.flags.computed_visible);

        let config = OutlinerConfig {
            include_hidden_entities: false,
            ..Default::default()
        };
        let filtered = build(&w.scene, &config);
        assert!(filtered.get_node(part_x.id, None).is_none());
    }

    #[test]
    fn test_selection_and_active_path() {
        let mut w = workshop();
        let scene = w.scene.scene_mut().unwrap();
        scene.active_path = vec![w.group_a];
        scene.selection = vec![w.part_y];

        let outliner = build(&w.scene, &OutlinerConfig::default());
        let group = outliner.get_node(Node::id_for_path(&[w.group_a]), None).unwrap();
        let part_x = outliner
            .get_node(Node::id_for_path(&[w.group_a, w.part_x]), None)
            .unwrap();
        let part_y = outliner
            .get_node(Node::id_for_path(&[w.group_a, w.part_y]), None)
            .unwrap();

        assert!(group.flags.active);
        assert!(!part_x.flags.active);
        assert!(!part_x.flags.selected);
        assert!(part_y.flags.selected);
    }

    #[test]
    fn test_expand_all() {
        let w = workshop();
        let config = OutlinerConfig {
            expand_all: true,
            ..Default::default()
        };
        let outliner = build(&w.scene, &config);
        assert!(outliner.store().iter().all(|n| n.flags.expanded));
    }

    #[test]
    fn test_recursive_definition_is_cut() {
        let mut model = SceneModel::new("Loop.skp", "Loop");
        let looping = model.add_definition("Loop", None);
        let outer = model.add_instance(None, "", looping).unwrap();
        model.add_instance(Some(looping), "", looping).unwrap();
        let host = MemoryScene::new(model);

        let outliner = build(&host, &OutlinerConfig::default());
        assert_eq!(
            outliner.diagnostics().errors,
            vec![ERROR_RECURSIVE_DEFINITION.to_string()]
        );
        assert!(outliner.get_node(Node::id_for_path(&[outer]), None).is_some());
        assert!(outliner.store().validate().is_ok());
    }
}
