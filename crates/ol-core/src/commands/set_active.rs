use super::{NodeRef, find_node, live_outliner};
use crate::error::OutlinerResult;
use crate::outliner::Outliner;

/// Mark the path from the root to a node as active
///
/// Every node off that path is cleared. The host is not touched.
pub fn set_active(outliner: Option<&mut Outliner>, payload: &NodeRef) -> OutlinerResult<()> {
    let outliner = live_outliner(outliner)?;
    let target = find_node(outliner, payload.id)?.id;
    let path = outliner.store().path_to_root(target)?;

    for node in outliner.store_mut().iter_mut() {
        node.flags.active = false;
    }
    for id in &path {
        if let Some(node) = outliner.get_node_mut(*id) {
            node.flags.active = true;
        }
    }
    tracing::debug!("Active path now ends at {}", target);
    Ok(())
}
