use super::{
    CommandContext, UpdatePayload, find_node, live_outliner, require_model, resolve_entity,
};
use crate::error::{OutlinerError, OutlinerResult};
use crate::host::Operation;

/// Patch a node, writing name and visibility through to its host entity
///
/// Name and visibility also land on every other node showing the same
/// entity; the expanded and selected flags stay local to the target.
pub fn update(ctx: CommandContext<'_>, payload: &UpdatePayload) -> OutlinerResult<()> {
    let CommandContext {
        outliner,
        host,
        config,
        ..
    } = ctx;
    let outliner = live_outliner(outliner)?;
    require_model(host)?;

    let node = find_node(outliner, payload.id)?;
    if node.is_root() && payload.writes_host() {
        return Err(OutlinerError::InvalidCommand(
            "the model root cannot be renamed or hidden".into(),
        ));
    }
    let entity = if node.is_root() {
        None
    } else {
        Some(resolve_entity(host, node)?)
    };
    let instance_like = node.node_type.is_instance();
    let definition = node.definition;

    if let Some(entity) = entity
        && payload.writes_host()
    {
        let mut op = Operation::start(host, config.operations.update.as_str())?;
        if let Some(name) = &payload.name {
            op.set_entity_name(entity, name)?;
        }
        if let Some(visible) = payload.visible {
            op.set_entity_visible(entity, visible)?;
        }
        op.commit()?;
        tracing::info!("Updated entity {} of node {}", entity, payload.id);
    }

    // Empty instance names display the definition name
    let display_name = payload.name.as_ref().map(|name| {
        if name.is_empty() && instance_like {
            definition
                .and_then(|d| host.definition(d))
                .map(|d| d.name)
                .unwrap_or_default()
        } else {
            name.clone()
        }
    });

    let aliases = entity
        .map(|e| outliner.nodes_for_entity(e))
        .unwrap_or_default();
    for id in aliases {
        if let Some(node) = outliner.get_node_mut(id) {
            if let Some(name) = &display_name {
                node.name = name.clone();
            }
            if let Some(visible) = payload.visible {
                node.flags.visible = visible;
            }
        }
        if payload.visible.is_some() {
            outliner.refresh_visibility(id);
        }
    }

    let node = outliner
        .get_node_mut(payload.id)
        .ok_or(OutlinerError::NodeNotFound(payload.id))?;
    if let Some(expanded) = payload.expanded {
        node.flags.expanded = expanded;
    }
    if let Some(selected) = payload.selected {
        node.flags.selected = selected;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::Harness;
    use crate::host::SceneHost;
    use crate::node::{Node, NodeId};

    #[test]
    fn test_rename_writes_host() {
        let mut h = Harness::new();
        let path = [h.w.group_a, h.w.part_x];
        let mut payload = UpdatePayload::new(Node::id_for_path(&path));
        payload.name = Some("Leg-A".into());
        update(h.ctx(), &payload).unwrap();

        assert_eq!(h.node(&path).name, "Leg-A");
        assert_eq!(h.scene().entity(h.w.part_x).unwrap().name, "Leg-A");
        assert_eq!(h.scene().undo_names(), ["Outliner Update"]);
    }

    #[test]
    fn test_empty_name_falls_back_to_definition() {
        let mut h = Harness::new();
        let path = [h.w.group_a, h.w.part_x];
        let mut payload = UpdatePayload::new(Node::id_for_path(&path));
        payload.name = Some(String::new());
        update(h.ctx(), &payload).unwrap();

        assert_eq!(h.node(&path).name, "Leg");
        assert_eq!(h.scene().entity(h.w.part_x).unwrap().name, "");
    }

    #[test]
    fn test_ui_only_patch_opens_no_operation() {
        let mut h = Harness::new();
        let path = [h.w.drawer];
        let mut payload = UpdatePayload::new(Node::id_for_path(&path));
        payload.expanded = Some(true);
        payload.selected = Some(true);
        update(h.ctx(), &payload).unwrap();

        assert!(h.node(&path).flags.expanded);
        assert!(h.node(&path).flags.selected);
        assert!(h.scene().undo_names().is_empty());
    }

    #[test]
    fn test_empty_patch_succeeds() {
        let mut h = Harness::new();
        let payload = UpdatePayload::new(Node::id_for_path(&[h.w.shelf]));
        update(h.ctx(), &payload).unwrap();
        assert!(h.scene().undo_names().is_empty());
    }

    #[test]
    fn test_visibility_does_not_cascade() {
        let mut h = Harness::new();
        let mut payload = UpdatePayload::new(Node::id_for_path(&[h.w.group_a]));
        payload.visible = Some(false);
        update(h.ctx(), &payload).unwrap();

        let part_x = h.node(&[h.w.group_a, h.w.part_x]);
        assert!(part_x.flags.visible);
        assert!(!part_x.flags.computed_visible);
        assert!(h.scene().entity(h.w.part_x).unwrap().visible);
        assert!(!h.scene().entity(h.w.group_a).unwrap().visible);
    }

    #[test]
    fn test_every_placement_shows_the_update() {
        let mut h = Harness::new();
        let spare = h.place_second_drawer();
        let first = [h.w.drawer, h.w.side];
        let second = [spare, h.w.side];

        let mut payload = UpdatePayload::new(Node::id_for_path(&first));
        payload.name = Some("Right".into());
        payload.visible = Some(false);
        payload.expanded = Some(true);
        update(h.ctx(), &payload).unwrap();

        assert_eq!(h.scene().entity(h.w.side).unwrap().name, "Right");
        for path in [&first, &second] {
            assert_eq!(h.node(path).name, "Right");
            assert!(!h.node(path).flags.visible);
            assert!(!h.node(path).flags.computed_visible);
        }
        assert!(h.node(&first).flags.expanded);
        assert!(!h.node(&second).flags.expanded);

        let mut payload = UpdatePayload::new(Node::id_for_path(&second));
        payload.name = Some(String::new());
        update(h.ctx(), &payload).unwrap();
        assert_eq!(h.node(&first).name, "Side");
        assert_eq!(h.node(&second).name, "Side");
    }

    #[test]
    fn test_errors() {
        let mut h = Harness::new();
        let unknown = NodeId::new_v4();
        assert_eq!(
            update(h.ctx(), &UpdatePayload::new(unknown)),
            Err(OutlinerError::NodeNotFound(unknown))
        );

        let mut rename_root = UpdatePayload::new(h.outliner.root_id());
        rename_root.name = Some("Model".into());
        assert!(matches!(
            update(h.ctx(), &rename_root),
            Err(OutlinerError::InvalidCommand(_))
        ));

        h.outliner.invalidate();
        assert_eq!(
            update(h.ctx(), &UpdatePayload::new(unknown)),
            Err(OutlinerError::ObsoleteTree)
        );
    }

    #[test]
    fn test_gone_entity_leaves_scene_untouched() {
        let mut h = Harness::new();
        let before = h.scene().scene().cloned();
        let path = [h.w.group_a, h.w.part_x];
        h.w.scene.scene_mut().unwrap().erase_entity(h.w.part_x).unwrap();
        let after_erase = h.scene().scene().cloned();
        assert_ne!(before, after_erase);

        let mut payload = UpdatePayload::new(Node::id_for_path(&path));
        payload.name = Some("Leg-A".into());
        assert_eq!(
            update(h.ctx(), &payload),
            Err(OutlinerError::EntityGone(payload.id))
        );
        assert_eq!(h.scene().scene().cloned(), after_erase);
        assert_eq!(h.scene().entity(h.w.part_y).unwrap().name, "B");
        assert_eq!(h.node(&path).name, "A");
    }
}
