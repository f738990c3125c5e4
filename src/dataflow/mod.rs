//! The data-flow graph: transform nodes between a data source and the
//! datasets marks read from.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`], so merging,
//! hoisting and pruning are index rewrites. A node is in its parent's child
//! list iff its parent pointer names that parent; every mutation below keeps
//! both directions in step.

pub mod aggregate;
pub mod assemble;
pub mod bin;
pub mod filter;
pub mod formula;
pub mod node;
pub mod optimizer;
pub mod timeunit;
pub mod validate;

pub use aggregate::AggregateNode;
pub use assemble::assemble;
pub use bin::{BinComponent, BinNode};
pub use filter::FilterNode;
pub use formula::FormulaNode;
pub use node::{OutputNode, SourceNode, TransformNode};
pub use optimizer::DataFlowOptimizer;
pub use timeunit::{TimeUnitComponent, TimeUnitNode};

use indexmap::IndexSet;

/// Insertion-ordered set of field names.
pub type FieldSet = IndexSet<String, ahash::RandomState>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
struct Slot {
    node: TransformNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena of transform nodes. Removed nodes leave an empty slot behind so
/// ids stay stable.
#[derive(Debug, Clone, Default)]
pub struct DataFlow {
    slots: Vec<Option<Slot>>,
    roots: Vec<NodeId>,
}

impl DataFlow {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, node: TransformNode) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Some(Slot {
            node,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    fn slot(&self, id: NodeId) -> &Slot {
        match self.slots.get(id.0) {
            Some(Some(slot)) => slot,
            _ => panic!("data-flow node {:?} was removed", id),
        }
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        match self.slots.get_mut(id.0) {
            Some(Some(slot)) => slot,
            _ => panic!("data-flow node {:?} was removed", id),
        }
    }

    pub fn add_root(&mut self, node: TransformNode) -> NodeId {
        let id = self.insert(node);
        self.roots.push(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, node: TransformNode) -> NodeId {
        let id = self.insert(node);
        self.attach(Some(parent), id);
        id
    }

    /// Links a detached node under `parent`, or as a new root.
    pub fn attach(&mut self, parent: Option<NodeId>, id: NodeId) {
        self.slot_mut(id).parent = parent;
        match parent {
            Some(parent) => self.slot_mut(parent).children.push(id),
            None => self.roots.push(id),
        }
    }

    /// A deep copy of a node's transform, as a new node with no parent.
    pub fn clone_node(&mut self, id: NodeId) -> NodeId {
        let node = self.slot(id).node.clone();
        self.insert(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    pub fn node(&self, id: NodeId) -> &TransformNode {
        &self.slot(id).node
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TransformNode {
        &mut self.slot_mut(id).node
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slot(id).children
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live node ids in insertion order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// Every node below `id`, parents before children.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// The list `id` sits in: its parent's children, or the roots.
    fn siblings_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent {
            Some(parent) => &mut self.slot_mut(parent).children,
            None => &mut self.roots,
        }
    }

    /// Removes a node, splicing its children into its place.
    ///
    /// # Panics
    ///
    /// If `id` was already removed or merged away.
    pub fn remove(&mut self, id: NodeId) -> TransformNode {
        let parent = self.parent(id);
        let children = std::mem::take(&mut self.slot_mut(id).children);
        for child in &children {
            self.slot_mut(*child).parent = parent;
        }
        let siblings = self.siblings_mut(parent);
        if let Some(position) = siblings.iter().position(|s| *s == id) {
            siblings.remove(position);
            for (offset, child) in children.into_iter().enumerate() {
                siblings.insert(position + offset, child);
            }
        }
        match self.slots[id.0].take() {
            Some(slot) => slot.node,
            None => panic!("data-flow node {:?} was removed", id),
        }
    }

    /// Merges `absorb` into `keep` and moves its children under `keep`.
    /// Returns `false`, leaving the graph untouched, when the two node kinds
    /// do not merge.
    pub fn merge_into(&mut self, keep: NodeId, absorb: NodeId) -> bool {
        if keep == absorb || !self.node(keep).can_merge(self.node(absorb)) {
            return false;
        }
        let parent = self.parent(absorb);
        let children = std::mem::take(&mut self.slot_mut(absorb).children);
        self.siblings_mut(parent).retain(|s| *s != absorb);

        let Some(absorbed) = self.slots[absorb.0].take() else {
            return false;
        };
        self.node_mut(keep).merge(absorbed.node);
        for child in children {
            self.attach(Some(keep), child);
        }
        true
    }

    /// Moves `id` above its parent: `id` takes the parent's place and the
    /// parent adopts `id`'s children.
    pub fn swap_with_parent(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let grandparent = self.parent(parent);

        let children = std::mem::take(&mut self.slot_mut(id).children);
        self.slot_mut(parent).children.retain(|c| *c != id);
        for child in &children {
            self.slot_mut(*child).parent = Some(parent);
        }
        self.slot_mut(parent).children.extend(children);

        let siblings = self.siblings_mut(grandparent);
        if let Some(position) = siblings.iter().position(|s| *s == parent) {
            siblings[position] = id;
        }
        self.slot_mut(id).parent = grandparent;
        self.slot_mut(id).children = vec![parent];
        self.slot_mut(parent).parent = Some(id);
    }
}
