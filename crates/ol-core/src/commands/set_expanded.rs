use super::{SetExpandedPayload, live_outliner};
use crate::error::{OutlinerError, OutlinerResult};
use crate::outliner::Outliner;

/// Set the UI-only expanded flag of a node
pub fn set_expanded(
    outliner: Option<&mut Outliner>,
    payload: &SetExpandedPayload,
) -> OutlinerResult<()> {
    let outliner = live_outliner(outliner)?;
    let node = outliner
        .get_node_mut(payload.id)
        .ok_or(OutlinerError::NodeNotFound(payload.id))?;
    node.flags.expanded = payload.expanded;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::Harness;
    use crate::node::{Node, NodeId};

    #[test]
    fn test_expand_and_collapse() {
        let mut h = Harness::new();
        let id = Node::id_for_path(&[h.w.drawer]);
        assert!(!h.node(&[h.w.drawer]).flags.expanded);

        set_expanded(Some(&mut h.outliner), &SetExpandedPayload { id, expanded: true }).unwrap();
        assert!(h.node(&[h.w.drawer]).flags.expanded);

        set_expanded(Some(&mut h.outliner), &SetExpandedPayload { id, expanded: false }).unwrap();
        assert!(!h.node(&[h.w.drawer]).flags.expanded);
        assert!(h.scene().undo_names().is_empty());
    }

    #[test]
    fn test_unknown_node() {
        let mut h = Harness::new();
        let id = NodeId::new_v4();
        assert_eq!(
            set_expanded(Some(&mut h.outliner), &SetExpandedPayload { id, expanded: true }),
            Err(OutlinerError::NodeNotFound(id))
        );
    }
}
