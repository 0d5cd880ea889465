//! Arena-backed planning tree.
//!
//! Nodes are stored in insertion order and addressed by a [`NodeId`]; each
//! slot records its parent and children so path extraction and pruning are
//! index traversals. Ids are stable between commits. A commit drops the
//! pruned slots and renumbers the survivors in their original order, so the
//! new root is always id 0 and "lowest id" remains the insertion-order
//! tie-break for path selection.

use log::debug;
use thiserror::Error;

use super::state::{Control, Node};
use crate::simulation::geometry::Position;

/// Handle of a node within one [`Tree`], valid until the next commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Insertion index of the node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
struct Slot {
    node: Node,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    closed: bool,
}

/// Structural violations reported by [`Tree::check_invariants`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("node {0:?} has no parent but is not the root")]
    Orphan(NodeId),
    #[error("edge {parent:?} -> {child:?} references a missing node")]
    DanglingEdge { parent: NodeId, child: NodeId },
    #[error("edge {parent:?} -> {child:?} advances time by {delta} instead of 1")]
    TimeStep {
        parent: NodeId,
        child: NodeId,
        delta: i64,
    },
    #[error("edge {parent:?} -> {child:?} decreases cost")]
    CostDecrease { parent: NodeId, child: NodeId },
    #[error("node {0:?} is not reachable from the root")]
    Unreachable(NodeId),
    #[error("node {0:?} exceeds the budget but is still open")]
    OpenOverBudget(NodeId),
}

/// The `(V, E, V_closed)` planning structure, rooted at the agent's
/// committed state.
#[derive(Clone, Debug)]
pub struct Tree {
    slots: Vec<Slot>,
}

impl Tree {
    const ROOT: NodeId = NodeId(0);

    /// Tree holding only the root.
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self {
            slots: vec![Slot {
                node: root,
                parent: None,
                children: Vec::new(),
                closed: false,
            }],
        }
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.0)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots.get_mut(id.0)
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        Self::ROOT
    }

    #[must_use]
    pub fn root_node(&self) -> &Node {
        &self.slots[Self::ROOT.0].node
    }

    /// Number of nodes (`|V|`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// A tree always holds its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.slots.len()
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slot(id).map(|s| &s.node)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slot_mut(id).map(|s| &mut s.node)
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.parent)
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map_or(&[], |s| s.children.as_slice())
    }

    #[must_use]
    pub fn is_closed(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|s| s.closed)
    }

    /// Adds `id` to `V_closed`.
    pub fn close(&mut self, id: NodeId) {
        if let Some(slot) = self.slot_mut(id) {
            slot.closed = true;
        }
    }

    /// Node ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.slots.len()).map(NodeId)
    }

    /// Nodes paired with their ids, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| (NodeId(i), &s.node))
    }

    /// `V_open = V − V_closed`, in insertion order.
    pub fn open_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.closed)
            .map(|(i, _)| NodeId(i))
    }

    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open_ids().count()
    }

    /// Directed `(parent, child)` edges.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.parent.map(|parent| (parent, NodeId(i))))
    }

    /// Nodes without children.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.children.is_empty())
            .map(|(i, _)| NodeId(i))
    }

    /// `id` and all of its descendants, depth first. Empty if `id` is not in
    /// the tree.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut found = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            found.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        found
    }

    /// Appends `node` as a child of `parent`. Returns `None` if the parent
    /// is not in the tree.
    pub fn insert(&mut self, parent: NodeId, node: Node) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            node,
            parent: Some(parent),
            children: Vec::new(),
            closed: false,
        });
        self.slots[parent.0].children.push(id);
        Some(id)
    }

    /// Whether `parent` already has a child within `tolerance` of `position`.
    #[must_use]
    pub fn has_twin(&self, parent: NodeId, position: &Position, tolerance: f64) -> bool {
        self.children(parent).iter().any(|&c| {
            self.get(c)
                .is_some_and(|n| n.position().distance(position) < tolerance)
        })
    }

    /// Node with the highest reward; ties go to the lowest id.
    ///
    /// With `prefer_goal`, nodes that reached the goal win over all others.
    #[must_use]
    pub fn best_node(&self, prefer_goal: bool) -> NodeId {
        let goal_present = prefer_goal && self.nodes().any(|(_, n)| n.goal_reached);
        let mut best = Self::ROOT;
        let mut best_reward = f64::NEG_INFINITY;
        for (id, node) in self.nodes() {
            if goal_present && !node.goal_reached {
                continue;
            }
            if node.reward > best_reward {
                best = id;
                best_reward = node.reward;
            }
        }
        best
    }

    /// Ids from the root down to `id` (inclusive). Empty if `id` is not in
    /// the tree.
    #[must_use]
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Root-to-leaf path ending at the best node.
    #[must_use]
    pub fn select_path(&self, prefer_goal: bool) -> Vec<NodeId> {
        self.path_to(self.best_node(prefer_goal))
    }

    /// Executes the root edge leading to `next`.
    ///
    /// `next` becomes the new root; the old root and every other subtree
    /// hanging off it are dropped and the survivors are renumbered, which
    /// invalidates every id handed out before the call. Returns the control
    /// that was executed, or `None` (tree untouched) if `next` is not a
    /// child of the root.
    pub fn commit(&mut self, next: NodeId) -> Option<Control> {
        if self.parent(next) != Some(Self::ROOT) {
            return None;
        }
        let before = self.slots.len();
        let mut keep = vec![false; before];
        for id in self.subtree(next) {
            keep[id.0] = true;
        }

        // Survivors keep their relative order, so `next` lands on 0.
        let mut remap = vec![None; before];
        let mut kept = 0;
        for (i, &k) in keep.iter().enumerate() {
            if k {
                remap[i] = Some(NodeId(kept));
                kept += 1;
            }
        }
        let slots = std::mem::take(&mut self.slots);
        self.slots = slots
            .into_iter()
            .zip(keep)
            .filter_map(|(slot, k)| k.then_some(slot))
            .map(|mut slot| {
                slot.parent = slot.parent.and_then(|p| remap[p.0]);
                slot.children = slot.children.iter().filter_map(|c| remap[c.0]).collect();
                slot
            })
            .collect();

        let control = self.slots[Self::ROOT.0].node.control.take();
        debug!(
            "Committed {:?}: pruned {} nodes, {} remain",
            next,
            before - self.slots.len(),
            self.slots.len()
        );
        control
    }

    /// Checks the structural invariants of the tree.
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn check_invariants(&self, budget: f64) -> Result<(), InvariantViolation> {
        for (id, node) in self.nodes() {
            match self.parent(id) {
                None if id != Self::ROOT => return Err(InvariantViolation::Orphan(id)),
                None => {}
                Some(parent) => {
                    let Some(p) = self.get(parent) else {
                        return Err(InvariantViolation::DanglingEdge { parent, child: id });
                    };
                    let delta = i64::from(node.time_step) - i64::from(p.time_step);
                    if delta != 1 {
                        return Err(InvariantViolation::TimeStep {
                            parent,
                            child: id,
                            delta,
                        });
                    }
                    if node.cost < p.cost {
                        return Err(InvariantViolation::CostDecrease { parent, child: id });
                    }
                }
            }
            if node.cost > budget && !self.is_closed(id) {
                return Err(InvariantViolation::OpenOverBudget(id));
            }
        }

        // Reachability also rules out cycles: every node must be found
        // exactly once walking down from the root.
        let mut seen = vec![false; self.slots.len()];
        let mut stack = vec![Self::ROOT];
        while let Some(current) = stack.pop() {
            if std::mem::replace(&mut seen[current.0], true) {
                continue;
            }
            for &child in self.children(current) {
                if !self.contains(child) {
                    return Err(InvariantViolation::DanglingEdge {
                        parent: current,
                        child,
                    });
                }
                stack.push(child);
            }
        }
        match seen.iter().position(|s| !s) {
            Some(i) => Err(InvariantViolation::Unreachable(NodeId(i))),
            None => Ok(()),
        }
    }
}
