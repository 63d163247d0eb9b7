//! Generated outliner snapshot
//!
//! An [`Outliner`] wraps one generated node tree together with its layer
//! catalog, diagnostics and obsolescence flag. It is created by the generate
//! command only and is never revived once obsolete.

mod transport;

pub use transport::{AvailableLayer, Diagnostics, TransportNode, TransportTree};

use crate::bus::{InvalidationBus, ListenerId};
use crate::host::EntityId;
use crate::node::{Node, NodeId, NodeStore};

/// A generated outliner tree
#[derive(Debug)]
pub struct Outliner {
    store: NodeStore,
    available_layers: Vec<AvailableLayer>,
    diagnostics: Diagnostics,
    filename: String,
    model_name: String,
    obsolete: bool,
    bus: InvalidationBus,
}

impl Outliner {
    pub(crate) fn new(
        store: NodeStore,
        available_layers: Vec<AvailableLayer>,
        diagnostics: Diagnostics,
        filename: String,
        model_name: String,
    ) -> Self {
        Self {
            store,
            available_layers,
            diagnostics,
            filename,
            model_name,
            obsolete: false,
            bus: InvalidationBus::default(),
        }
    }

    pub fn root(&self) -> &Node {
        self.store.root()
    }

    pub fn root_id(&self) -> NodeId {
        self.store.root_id()
    }

    /// Find a node by id in the subtree of `root` (default: the whole tree)
    pub fn get_node(&self, id: NodeId, root: Option<NodeId>) -> Option<&Node> {
        self.store
            .find_depth_first(id, root.unwrap_or_else(|| self.store.root_id()))
    }

    pub(crate) fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.store.get_mut(id)
    }

    /// Nodes standing for `entity`, in depth-first order
    ///
    /// An entity owned by a shared definition shows up once per placement.
    pub fn nodes_for_entity(&self, entity: EntityId) -> Vec<NodeId> {
        self.store
            .descendants_depth_first(self.store.root_id())
            .into_iter()
            .filter(|id| self.store.get(*id).and_then(|n| n.entity_id()) == Some(entity))
            .collect()
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut NodeStore {
        &mut self.store
    }

    pub fn node_count(&self) -> usize {
        self.store.node_count()
    }

    pub fn available_layers(&self) -> &[AvailableLayer] {
        &self.available_layers
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    // ============== Invalidation ==============

    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    /// Mark the outliner obsolete
    ///
    /// Listeners are notified on the first call only. Returns whether this
    /// call made the transition.
    pub fn invalidate(&mut self) -> bool {
        if self.obsolete {
            return false;
        }
        self.obsolete = true;
        tracing::debug!("Outliner of '{}' is now obsolete", self.filename);

        let mut bus = std::mem::take(&mut self.bus);
        bus.notify(self);
        self.bus = bus;
        true
    }

    /// Register a listener called when the outliner becomes obsolete
    pub fn subscribe(&mut self, listener: impl FnMut(&Outliner) + Send + 'static) -> ListenerId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    // ============== Visibility ==============

    /// Recompute `computed_visible` for the subtree of `id`
    pub(crate) fn refresh_visibility(&mut self, id: NodeId) {
        let parent_visible = self
            .store
            .get(id)
            .and_then(|n| n.parent)
            .and_then(|p| self.store.get(p))
            .is_none_or(|p| p.flags.computed_visible);
        self.propagate_visibility(id, parent_visible);
    }

    fn propagate_visibility(&mut self, id: NodeId, parent_visible: bool) {
        let Some(node) = self.store.get_mut(id) else {
            return;
        };
        let visible = node.is_root()
            || (parent_visible && node.flags.visible && node.layer_visible);
        node.flags.computed_visible = visible;
        let children = node.children.clone();
        for child in children {
            self.propagate_visibility(child, visible);
        }
    }

    // ============== Transport ==============

    /// Build the transport tree
    pub fn to_transport(&self) -> TransportTree {
        TransportTree {
            root: self.transport_node(self.store.root()),
            available_layers: self.available_layers.clone(),
            errors: self.diagnostics.errors.clone(),
            warnings: self.diagnostics.warnings.clone(),
            tips: self.diagnostics.tips.clone(),
            filename: self.filename.clone(),
            model_name: self.model_name.clone(),
        }
    }

    fn transport_node(&self, node: &Node) -> TransportNode {
        TransportNode {
            id: node.id,
            node_type: node.node_type,
            name: node.name.clone(),
            expanded: node.flags.expanded,
            visible: node.flags.visible,
            selected: node.flags.selected,
            active: node.flags.active,
            computed_visible: node.flags.computed_visible,
            layer: node.layer.clone(),
            children: node
                .children
                .iter()
                .filter_map(|c| self.store.get(*c))
                .map(|c| self.transport_node(c))
                .collect(),
        }
    }
}
