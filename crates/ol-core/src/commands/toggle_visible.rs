use super::{CommandContext, NodeRef, find_node, live_outliner, require_model, resolve_entity};
use crate::error::{OutlinerError, OutlinerResult};
use crate::host::Operation;

/// Flip the own visibility of a host entity and of every node showing it
///
/// The new state is derived from the host, so nodes standing for the same
/// entity under other placements of a shared definition stay in step.
/// Descendants keep their own flags; only their computed visibility changes.
pub fn toggle_visible(ctx: CommandContext<'_>, payload: &NodeRef) -> OutlinerResult<()> {
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
            "the model root cannot be hidden".into(),
        ));
    }
    let entity = resolve_entity(host, node)?;
    let visible = !host
        .entity(entity)
        .ok_or(OutlinerError::EntityGone(payload.id))?
        .visible;

    let mut op = Operation::start(host, config.operations.toggle_visible.as_str())?;
    op.set_entity_visible(entity, visible)?;
    op.commit()?;
    tracing::info!("Entity {} is now {}", entity, if visible { "visible" } else { "hidden" });

    for id in outliner.nodes_for_entity(entity) {
        if let Some(node) = outliner.get_node_mut(id) {
            node.flags.visible = visible;
        }
        outliner.refresh_visibility(id);
    }
    Ok(())
}
