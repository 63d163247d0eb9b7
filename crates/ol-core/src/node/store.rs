//! Arena of nodes indexed by id

use std::collections::{HashMap, HashSet};

use super::{Node, NodeId};

/// Node store errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("Duplicate node id: {0}")]
    DuplicateId(NodeId),
    #[error("The root node cannot be removed")]
    RootNotRemovable,
    #[error("Node {child} is not listed exactly once by its parent {parent}")]
    BrokenLink { parent: NodeId, child: NodeId },
    #[error("Node is not reachable from the root: {0}")]
    OrphanedNode(NodeId),
}

/// Owns every node of one generated tree
///
/// Parent and child links are ids into the arena; the root is never removed.
#[derive(Debug, Clone)]
pub struct NodeStore {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
}

impl NodeStore {
    /// Create a store holding only `root`
    pub fn new(mut root: Node) -> Self {
        root.parent = None;
        root.children.clear();
        let id = root.id;
        Self {
            nodes: HashMap::from([(id, root)]),
            root: id,
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &Node {
        &self.nodes[&self.root]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over all nodes (arbitrary order)
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate mutably over all nodes (arbitrary order)
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Append `node` as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId, StoreError> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        self.nodes
            .get_mut(&parent)
            .ok_or(StoreError::NodeNotFound(parent))?
            .children
            .push(id);
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Depth-first search for `id` in the subtree of `from`, first match wins
    pub fn find_depth_first(&self, id: NodeId, from: NodeId) -> Option<&Node> {
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            let node = self.nodes.get(&current)?;
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Ids from the root down to `id` (both included)
    pub fn path_to_root(&self, id: NodeId) -> Result<Vec<NodeId>, StoreError> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self
                .nodes
                .get(&node_id)
                .ok_or(StoreError::NodeNotFound(node_id))?;
            path.push(node_id);
            current = node.parent;
            if path.len() > self.nodes.len() {
                return Err(StoreError::OrphanedNode(id));
            }
        }
        path.reverse();
        Ok(path)
    }

    /// Ids of the subtree of `id` in pre-order (`id` first)
    pub fn descendants_depth_first(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        self.collect_depth_first(id, &mut result);
        result
    }

    fn collect_depth_first(&self, id: NodeId, result: &mut Vec<NodeId>) {
        if let Some(node) = self.nodes.get(&id) {
            result.push(id);
            for child in &node.children {
                self.collect_depth_first(*child, result);
            }
        }
    }

    /// Parent of `id` and the position of `id` among its children
    ///
    /// Succeeds exactly when [`NodeStore::dissolve`] would.
    pub fn splice_point(&self, id: NodeId) -> Result<(NodeId, usize), StoreError> {
        if id == self.root {
            return Err(StoreError::RootNotRemovable);
        }
        let parent_id = self
            .nodes
            .get(&id)
            .ok_or(StoreError::NodeNotFound(id))?
            .parent
            .ok_or(StoreError::OrphanedNode(id))?;
        let position = self
            .nodes
            .get(&parent_id)
            .ok_or(StoreError::NodeNotFound(parent_id))?
            .children
            .iter()
            .position(|c| *c == id)
            .ok_or(StoreError::BrokenLink {
                parent: parent_id,
                child: id,
            })?;
        Ok((parent_id, position))
    }

    /// Remove `id`, splicing its children into its parent at its position
    pub fn dissolve(&mut self, id: NodeId) -> Result<Node, StoreError> {
        let (parent_id, position) = self.splice_point(id)?;
        let node = self.nodes.remove(&id).ok_or(StoreError::NodeNotFound(id))?;
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent
                .children
                .splice(position..=position, node.children.iter().copied());
        }
        for child in &node.children {
            if let Some(child) = self.nodes.get_mut(child) {
                child.parent = Some(parent_id);
            }
        }
        Ok(node)
    }

    /// Check structural invariants
    pub fn validate(&self) -> Result<(), Vec<StoreError>> {
        let mut errors = Vec::new();

        for node in self.nodes.values() {
            for child in &node.children {
                match self.nodes.get(child) {
                    None => errors.push(StoreError::NodeNotFound(*child)),
                    Some(c) if c.parent != Some(node.id) => {
                        errors.push(StoreError::BrokenLink {
                            parent: node.id,
                            child: *child,
                        });
                    }
                    Some(_) => {}
                }
            }
            if let Some(parent) = node.parent {
                let listed = self
                    .nodes
                    .get(&parent)
                    .map_or(0, |p| p.children.iter().filter(|c| **c == node.id).count());
                if listed != 1 {
                    errors.push(StoreError::BrokenLink {
                        parent,
                        child: node.id,
                    });
                }
            }
        }

        let mut reachable = HashSet::new();
        for id in self.descendants_depth_first(self.root) {
            if !reachable.insert(id) {
                // Revisiting means a cycle or a shared child
                errors.push(StoreError::DuplicateId(id));
                break;
            }
        }
        for id in self.nodes.keys() {
            if !reachable.contains(id) {
                errors.push(StoreError::OrphanedNode(*id));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
