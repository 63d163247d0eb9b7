use std::collections::HashMap;

use super::{CommandContext, NodeRef, find_node, live_outliner, require_model, resolve_entity};
use crate::error::{OutlinerError, OutlinerResult};
use crate::host::{EntityId, Operation};
use crate::node::{NodeId, StoreError};
use crate::outliner::Outliner;

/// Dissolve a node into its parent
///
/// The node's children take its place in the parent, in their original
/// order, both in the tree and in the host scene. When the entity lives in a
/// shared definition every placement of it is dissolved.
pub fn explode(ctx: CommandContext<'_>, payload: &NodeRef) -> OutlinerResult<()> {
    let CommandContext {
        outliner,
        host,
        config,
        ..
    } = ctx;
    let outliner = live_outliner(outliner)?;
    require_model(host)?;

    let node = find_node(outliner, payload.id)?;
    if node.is_root() {
        return Err(OutlinerError::InvalidCommand(
            "the model root cannot be exploded".into(),
        ));
    }
    let entity = resolve_entity(host, node)?;
    let path = node.path.clone();

    // Every placement must be removable before the host is touched
    let placements = outliner.nodes_for_entity(entity);
    for id in &placements {
        outliner.store().splice_point(*id)?;
    }

    let mut op = Operation::start(host, config.operations.explode.as_str())?;
    let moved: HashMap<_, _> = op.explode(&path)?.into_iter().collect();
    op.commit()?;
    tracing::info!(
        "Exploded entity {} into {} children ({} placements)",
        entity,
        moved.len(),
        placements.len()
    );

    for id in placements {
        if let Err(e) = splice_placement(outliner, id, &moved) {
            tracing::error!("Tree out of sync after exploding node {}: {}", id, e);
            outliner.invalidate();
            return Err(e.into());
        }
    }
    Ok(())
}

/// Dissolve one placement and point its moved subtree at the new host entities
fn splice_placement(
    outliner: &mut Outliner,
    id: NodeId,
    moved: &HashMap<EntityId, EntityId>,
) -> Result<(), StoreError> {
    let removed = outliner.store_mut().dissolve(id)?;
    let Some((_, parent_path)) = removed.path.split_last() else {
        return Ok(());
    };
    let depth = parent_path.len();

    for child in &removed.children {
        for id in outliner.store().descendants_depth_first(*child) {
            let Some(node) = outliner.get_node_mut(id) else {
                continue;
            };
            let Some(new_step) = node.path.get(depth + 1).and_then(|old| moved.get(old)) else {
                tracing::warn!("No host counterpart for moved node {}", id);
                continue;
            };
            let mut rewritten = parent_path.to_vec();
            rewritten.push(*new_step);
            rewritten.extend_from_slice(&node.path[depth + 2..]);
            node.path = rewritten;
        }
    }

    if let Some(parent) = removed.parent {
        outliner.refresh_visibility(parent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::Harness;
    use crate::host::fixtures::{FailingScene, part};
    use crate::host::{HostError, SceneHost};
    use crate::node::Node;

    #[test]
    fn test_children_take_the_node_position() {
        let mut h = Harness::new();
        let group = Node::id_for_path(&[h.w.group_a]);
        let part_x = Node::id_for_path(&[h.w.group_a, h.w.part_x]);
        let part_y = Node::id_for_path(&[h.w.group_a, h.w.part_y]);
        let shelf = Node::id_for_path(&[h.w.shelf]);
        let drawer = Node::id_for_path(&[h.w.drawer]);

        explode(h.ctx(), &NodeRef { id: group }).unwrap();

        assert_eq!(h.outliner.root().children, vec![part_x, part_y, shelf, drawer]);
        assert!(h.outliner.get_node(group, None).is_none());
        assert_eq!(
            h.outliner.get_node(part_x, None).unwrap().parent,
            Some(h.outliner.root_id())
        );
        assert!(h.outliner.store().validate().is_ok());
        assert_eq!(h.scene().undo_names(), ["Outliner Explode"]);
    }

    #[test]
    fn test_moved_nodes_resolve_to_live_entities() {
        let mut h = Harness::new();
        let drawer = Node::id_for_path(&[h.w.drawer]);
        let side = Node::id_for_path(&[h.w.drawer, h.w.side]);

        explode(h.ctx(), &NodeRef { id: drawer }).unwrap();

        let node = h.outliner.get_node(side, None).unwrap();
        assert_eq!(node.path.len(), 1);
        let entity = h.scene().resolve_path(&node.path).unwrap();
        assert_eq!(h.scene().entity(entity).unwrap().name, "Left");
        assert!(h.scene().entity(h.w.drawer).is_none());
    }

    #[test]
    fn test_host_failure_leaves_tree_intact() {
        let mut h = Harness::new();
        let group = Node::id_for_path(&[h.w.group_a]);
        let before = h.scene().scene().cloned();
        // An operation already open makes the explode fail to start
        h.w.scene.start_operation("Foreign").unwrap();

        assert!(matches!(
            explode(h.ctx(), &NodeRef { id: group }),
            Err(OutlinerError::Host(_))
        ));
        h.w.scene.abort_operation().unwrap();
        assert_eq!(h.scene().scene().cloned(), before);
        assert!(h.outliner.get_node(group, None).is_some());
    }

    /// A "Tray" group inside the drawer definition holding one "Pin" part
    fn add_tray(h: &mut Harness) -> (EntityId, EntityId) {
        let drawer_def = h.w.drawer_def;
        let scene = h.w.scene.scene_mut().unwrap();
        let pin_def = scene.add_definition("Pin", Some(part(30.0, 8.0, 8.0)));
        let (tray, tray_def) = scene.add_group(Some(drawer_def), "Tray").unwrap();
        let pin = scene.add_instance(Some(tray_def), "", pin_def).unwrap();
        (tray, pin)
    }

    #[test]
    fn test_shared_container_explodes_every_placement() {
        let mut h = Harness::new();
        let (tray, pin) = add_tray(&mut h);
        let spare = h.place_second_drawer();
        let first = Node::id_for_path(&[h.w.drawer, tray]);
        let second = Node::id_for_path(&[spare, tray]);
        let second_pin = Node::id_for_path(&[spare, tray, pin]);

        explode(h.ctx(), &NodeRef { id: first }).unwrap();

        assert!(!h.outliner.is_obsolete());
        assert!(h.outliner.get_node(first, None).is_none());
        assert!(h.outliner.get_node(second, None).is_none());
        assert!(h.outliner.store().validate().is_ok());

        for drawer in [h.w.drawer, spare] {
            let children = &h.node(&[drawer]).children;
            assert_eq!(children.len(), 3);
            let moved = h.outliner.get_node(children[2], None).unwrap();
            assert_eq!(moved.name, "Pin");
            assert_eq!(moved.path[0], drawer);
            assert!(h.scene().resolve_path(&moved.path).is_some());
        }
        assert_eq!(
            h.outliner.get_node(second_pin, None).unwrap().parent,
            Some(Node::id_for_path(&[spare]))
        );
    }

    #[test]
    fn test_failed_commit_leaves_tree_and_scene_intact() {
        let mut h = Harness::new();
        let group = Node::id_for_path(&[h.w.group_a]);
        let before = h.w.scene.clone();
        let mut host = FailingScene::new(h.w.scene.clone(), "commit_operation", 0);

        assert!(matches!(
            explode(h.ctx_on(&mut host), &NodeRef { id: group }),
            Err(OutlinerError::Host(HostError::Io(_)))
        ));
        assert_eq!(host.inner.scene(), before.scene());
        assert!(host.inner.undo_names().is_empty());
        assert!(h.outliner.get_node(group, None).is_some());
        assert_eq!(h.outliner.node_count(), 8);
        assert!(h.outliner.store().validate().is_ok());
    }

    #[test]
    fn test_root_rejected() {
        let mut h = Harness::new();
        let root = h.outliner.root_id();
        assert!(matches!(
            explode(h.ctx(), &NodeRef { id: root }),
            Err(OutlinerError::InvalidCommand(_))
        ));
        assert_eq!(h.outliner.node_count(), 8);
    }
}
