use super::{DataFlow, FieldSet, NodeId, TransformNode};
use tracing::debug;

/// Rewrites a data-flow graph until it stops changing: merging bin and time
/// unit nodes, hoisting row-wise nodes towards their source, and pruning
/// nodes whose outputs nobody reads.
#[derive(Debug, Default)]
pub struct DataFlowOptimizer {
    /// Passes run by the last [`optimize`](Self::optimize) call.
    pub passes: usize,
}

/// Hoisting order: a node only moves above a parent of strictly lower rank,
/// which keeps the rewrite terminating.
fn move_rank(node: &TransformNode) -> Option<u8> {
    match node {
        TransformNode::TimeUnit(_) => Some(3),
        TransformNode::Formula(_) => Some(2),
        TransformNode::Bin(_) | TransformNode::Filter(_) => Some(1),
        _ => None,
    }
}

fn disjoint(a: &FieldSet, b: &FieldSet) -> bool {
    a.iter().all(|field| !b.contains(field))
}

impl DataFlowOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs all passes in a loop until the graph reaches a fixed point.
    pub fn optimize(&mut self, flow: &mut DataFlow) {
        self.passes = 0;
        loop {
            self.passes += 1;
            let merged = self.merge_siblings(flow);
            let absorbed = self.merge_with_parents(flow);
            let moved = self.move_up(flow);
            let pruned = self.prune(flow);

            if !(merged || absorbed || moved || pruned) {
                debug!(passes = self.passes, nodes = flow.len(), "data flow optimized");
                return;
            }
        }
    }

    /// Pass 1: sibling bin nodes (and sibling time unit nodes) become one.
    fn merge_siblings(&self, flow: &mut DataFlow) -> bool {
        let mut changed = false;
        for parent in flow.node_ids() {
            if !flow.contains(parent) {
                continue;
            }
            let children = flow.children(parent).to_vec();
            let mut keep_bin: Option<NodeId> = None;
            let mut keep_time_unit: Option<NodeId> = None;
            for child in children {
                let keep = match flow.node(child) {
                    TransformNode::Bin(_) => &mut keep_bin,
                    TransformNode::TimeUnit(_) => &mut keep_time_unit,
                    _ => continue,
                };
                match keep {
                    Some(keep) => {
                        debug!(keep = keep.0, absorb = child.0, kind = flow.node(child).kind(), "merging sibling nodes");
                        changed |= flow.merge_into(*keep, child);
                    }
                    None => *keep = Some(child),
                }
            }
        }
        changed
    }

    /// Pass 2: an only-child bin (time unit) folds into a bin (time unit) parent.
    fn merge_with_parents(&self, flow: &mut DataFlow) -> bool {
        let mut changed = false;
        for id in flow.node_ids() {
            if !flow.contains(id) {
                continue;
            }
            let Some(parent) = flow.parent(id) else {
                continue;
            };
            if flow.children(parent).len() == 1 && flow.node(parent).can_merge(flow.node(id)) {
                debug!(keep = parent.0, absorb = id.0, kind = flow.node(id).kind(), "merging into parent");
                changed |= flow.merge_into(parent, id);
            }
        }
        changed
    }

    /// Pass 3: hoists time unit and formula nodes above lower-ranked
    /// row-wise parents when neither reads what the other writes.
    fn move_up(&self, flow: &mut DataFlow) -> bool {
        let mut changed = false;
        for id in flow.node_ids() {
            if !flow.contains(id) {
                continue;
            }
            let node = flow.node(id);
            if !matches!(node, TransformNode::TimeUnit(_) | TransformNode::Formula(_)) {
                continue;
            }
            let Some(parent) = flow.parent(id) else {
                continue;
            };
            let parent_node = flow.node(parent);
            let ranked_lower = match (move_rank(node), move_rank(parent_node)) {
                (Some(rank), Some(parent_rank)) => parent_rank < rank,
                _ => false,
            };
            if !ranked_lower || flow.children(parent).len() != 1 {
                continue;
            }

            let produced = node.produced_fields();
            let mut parent_fields = parent_node.dependent_fields();
            parent_fields.extend(parent_node.produced_fields());
            if disjoint(&parent_node.produced_fields(), &node.dependent_fields())
                && disjoint(&produced, &parent_fields)
            {
                debug!(node = id.0, kind = node.kind(), above = parent_node.kind(), "moving node up");
                flow.swap_with_parent(id);
                changed = true;
            }
        }
        changed
    }

    /// Pass 4: removes formula, bin and time unit nodes whose outputs no
    /// descendant reads.
    fn prune(&self, flow: &mut DataFlow) -> bool {
        let mut changed = false;
        for id in flow.node_ids() {
            if !flow.contains(id) {
                continue;
            }
            if !matches!(
                flow.node(id),
                TransformNode::Formula(_) | TransformNode::Bin(_) | TransformNode::TimeUnit(_)
            ) {
                continue;
            }
            let produced = flow.node(id).produced_fields();
            let read = flow
                .descendants(id)
                .into_iter()
                .any(|d| !disjoint(&produced, &flow.node(d).dependent_fields()));
            if !read {
                debug!(node = id.0, kind = flow.node(id).kind(), "pruning unused node");
                flow.remove(id);
                changed = true;
            }
        }
        changed
    }
}
