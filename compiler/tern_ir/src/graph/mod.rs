//! The node arena and its mutation primitives.
//!
//! Nodes are stored in a `Vec` indexed by [`NodeId`]. Each node records its
//! data inputs and, symmetrically, the nodes that use it. Fixed nodes are
//! additionally linked into one control chain by `predecessor`/`next`
//! pointers, starting at the graph's `Start` node.
//!
//! # Replacement
//!
//! A node is replaced at most once. Replacement rewires every data usage to
//! the replacement, fixes up the control chain, and marks the old ID dead.
//! Dead IDs are never reused; any later mutation that names one fails with
//! [`GraphError::DeadNode`].
//!
//! - [`replace_fixed_with_floating`](Graph::replace_fixed_with_floating):
//!   the node's control slot disappears (predecessor links straight to
//!   successor).
//! - [`replace_fixed_with_fixed`](Graph::replace_fixed_with_fixed): the
//!   replacement takes over the exact control slot.

mod builder;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::assumptions::Assumptions;
use crate::constant::Constant;
use crate::node::{NodeFlags, NodeId, NodeKind};
use crate::stamp::Stamp;

pub use builder::GraphBuilder;

/// Misuse of a graph mutation primitive.
///
/// These are driver or pass bugs, never user errors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("{0:?} is dead")]
    DeadNode(NodeId),
    #[error("{node:?} ({kind}) is not a fixed node")]
    NotFixed { node: NodeId, kind: &'static str },
    #[error("{node:?} ({kind}) is not a floating node")]
    NotFloating { node: NodeId, kind: &'static str },
    #[error("{0:?} is already linked into the control chain")]
    AlreadyLinked(NodeId),
    #[error("{0:?} is not linked into the control chain")]
    NotLinked(NodeId),
    #[error("{0:?} still has usages")]
    HasUsages(NodeId),
    #[error("{0:?} terminates the control chain")]
    Terminator(NodeId),
    #[error("graph verification failed at {node:?}: {reason}")]
    Inconsistent { node: NodeId, reason: String },
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    stamp: Stamp,
    /// One entry per data edge, in operand order.
    inputs: SmallVec<[NodeId; 4]>,
    /// One entry per incoming data edge (a node using us twice appears twice).
    usages: SmallVec<[NodeId; 4]>,
    predecessor: Option<NodeId>,
    next: Option<NodeId>,
    alive: bool,
}

/// A compilation unit's IR graph.
///
/// Owns the [`Assumptions`] registry for the unit, if assumptions are
/// enabled. A graph is mutated by one thread at a time; independent graphs
/// may be compiled concurrently.
#[derive(Clone, Debug)]
pub struct Graph {
    nodes: Vec<NodeData>,
    start: NodeId,
    /// Interned constant nodes.
    constants: FxHashMap<Constant, NodeId>,
    assumptions: Option<Assumptions>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create a graph with an empty assumption registry.
    pub fn new() -> Self {
        Self::with_registry(Some(Assumptions::new()))
    }

    /// Create a graph that may not record assumptions.
    ///
    /// Speculation that needs an invalidation fact is off for such a graph.
    pub fn without_assumptions() -> Self {
        Self::with_registry(None)
    }

    fn with_registry(assumptions: Option<Assumptions>) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            start: NodeId::new(0),
            constants: FxHashMap::default(),
            assumptions,
        };
        graph.start = graph.push(NodeKind::Start, Stamp::Void, &[]);
        graph
    }

    // Node creation

    fn push(&mut self, kind: NodeKind, stamp: Stamp, inputs: &[NodeId]) -> NodeId {
        let id = NodeId::new(
            u32::try_from(self.nodes.len())
                .unwrap_or_else(|_| panic!("node count exceeds u32::MAX")),
        );
        for &input in inputs {
            debug_assert!(self.is_alive(input), "input {input:?} of new node is dead");
            self.nodes[input.index()].usages.push(id);
        }
        self.nodes.push(NodeData {
            kind,
            stamp,
            inputs: inputs.iter().copied().collect(),
            usages: SmallVec::new(),
            predecessor: None,
            next: None,
            alive: true,
        });
        id
    }

    /// Add a fixed node. It is not linked into the control chain until
    /// [`append`](Self::append) or a replacement places it.
    pub fn add_fixed(&mut self, kind: NodeKind, stamp: Stamp, inputs: &[NodeId]) -> NodeId {
        debug_assert!(kind.is_fixed(), "{} is not a fixed kind", kind.name());
        self.push(kind, stamp, inputs)
    }

    /// Add a floating node.
    pub fn add_floating(&mut self, kind: NodeKind, stamp: Stamp, inputs: &[NodeId]) -> NodeId {
        debug_assert!(!kind.is_fixed(), "{} is not a floating kind", kind.name());
        self.push(kind, stamp, inputs)
    }

    /// Get the node for `constant`, creating it on first use.
    ///
    /// Equal constants share one node, so folding the same value twice
    /// produces the same node. A shared node keeps the facts of every stamp
    /// it was requested with.
    pub fn unique_constant(&mut self, constant: Constant, stamp: Stamp) -> NodeId {
        if let Some(&id) = self.constants.get(&constant) {
            if self.is_alive(id) {
                let data = &mut self.nodes[id.index()];
                data.stamp = data.stamp.improve(stamp);
                return id;
            }
        }
        let id = self.push(NodeKind::Constant(constant), stamp, &[]);
        self.constants.insert(constant, id);
        id
    }

    // Queries

    /// The `Start` node.
    #[inline]
    pub fn start(&self) -> NodeId {
        self.start
    }

    /// Returns `true` if `id` names a node that has not been replaced.
    #[inline]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).is_some_and(|n| n.alive)
    }

    /// The kind of `id`. Dead nodes keep the kind they had when replaced.
    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    /// The stamp of `id`.
    #[inline]
    pub fn stamp(&self, id: NodeId) -> Stamp {
        self.nodes[id.index()].stamp
    }

    /// Data inputs of `id`, in operand order.
    #[inline]
    pub fn inputs(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].inputs
    }

    /// Nodes using `id` as a data input, one entry per edge.
    #[inline]
    pub fn usages(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].usages
    }

    /// Control successor of a fixed node.
    #[inline]
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].next
    }

    /// Control predecessor of a fixed node.
    #[inline]
    pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].predecessor
    }

    /// Returns `true` if `id` is a fixed node.
    #[inline]
    pub fn is_fixed(&self, id: NodeId) -> bool {
        self.kind(id).is_fixed()
    }

    /// Total number of nodes ever allocated, dead ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// IDs of all live nodes, in allocation order.
    pub fn live_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.alive)
            .map(|(i, _)| NodeId::new(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    /// Number of live nodes whose kind matches `pred`.
    pub fn count_live(&self, pred: impl Fn(&NodeKind) -> bool) -> usize {
        self.nodes.iter().filter(|n| n.alive && pred(&n.kind)).count()
    }

    /// Fixed nodes in control order, starting at `Start`.
    pub fn fixed_chain(&self) -> Vec<NodeId> {
        let mut chain = vec![self.start];
        let mut current = self.start;
        while let Some(next) = self.next(current) {
            chain.push(next);
            current = next;
        }
        chain
    }

    /// The unit's assumption registry, if assumptions are enabled.
    #[inline]
    pub fn assumptions(&self) -> Option<&Assumptions> {
        self.assumptions.as_ref()
    }

    /// Mutable access to the unit's assumption registry.
    #[inline]
    pub fn assumptions_mut(&mut self) -> Option<&mut Assumptions> {
        self.assumptions.as_mut()
    }

    // Control-chain editing

    /// Link the unlinked fixed node `node` directly after `after`.
    pub fn append(&mut self, after: NodeId, node: NodeId) -> Result<(), GraphError> {
        self.check_fixed(after)?;
        self.check_fixed(node)?;
        self.check_unlinked(node)?;
        if self.kind(after).flags().contains(NodeFlags::TERMINATOR) {
            return Err(GraphError::Terminator(after));
        }
        if after != self.start && self.predecessor(after).is_none() {
            return Err(GraphError::NotLinked(after));
        }

        let old_next = self.nodes[after.index()].next;
        self.nodes[after.index()].next = Some(node);
        self.nodes[node.index()].predecessor = Some(after);
        self.nodes[node.index()].next = old_next;
        if let Some(succ) = old_next {
            self.nodes[succ.index()].predecessor = Some(node);
        }
        Ok(())
    }

    /// Link the unlinked fixed node `node` directly before `anchor`.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) -> Result<(), GraphError> {
        self.check_fixed(anchor)?;
        let pred = self.predecessor(anchor).ok_or(GraphError::NotLinked(anchor))?;
        self.append(pred, node)
    }

    // Replacement

    /// Replace the fixed node `node` by the floating node `replacement`.
    ///
    /// Every data usage of `node` is redirected to `replacement`; the
    /// control predecessor of `node` is linked straight to its successor.
    /// `node` is dead afterwards.
    pub fn replace_fixed_with_floating(
        &mut self,
        node: NodeId,
        replacement: NodeId,
    ) -> Result<(), GraphError> {
        self.check_linked_fixed(node)?;
        self.check_alive(replacement)?;
        if self.is_fixed(replacement) {
            return Err(GraphError::NotFloating {
                node: replacement,
                kind: self.kind(replacement).name(),
            });
        }

        self.replace_at_usages(node, replacement);
        self.unlink(node);
        self.kill(node);
        Ok(())
    }

    /// Replace the fixed node `node` by the unlinked fixed node
    /// `replacement`, which takes over `node`'s exact control slot.
    ///
    /// Every data usage of `node` is redirected to `replacement`. `node` is
    /// dead afterwards.
    pub fn replace_fixed_with_fixed(
        &mut self,
        node: NodeId,
        replacement: NodeId,
    ) -> Result<(), GraphError> {
        self.check_linked_fixed(node)?;
        self.check_fixed(replacement)?;
        self.check_unlinked(replacement)?;

        let pred = self.nodes[node.index()].predecessor;
        let next = self.nodes[node.index()].next;
        if let Some(pred) = pred {
            self.nodes[pred.index()].next = Some(replacement);
        }
        if let Some(next) = next {
            self.nodes[next.index()].predecessor = Some(replacement);
        }
        self.nodes[replacement.index()].predecessor = pred;
        self.nodes[replacement.index()].next = next;
        self.nodes[node.index()].predecessor = None;
        self.nodes[node.index()].next = None;

        self.replace_at_usages(node, replacement);
        self.kill(node);
        Ok(())
    }

    /// Unlink and kill a fixed node nothing uses.
    pub fn remove_fixed(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.check_linked_fixed(node)?;
        if !self.usages(node).is_empty() {
            return Err(GraphError::HasUsages(node));
        }
        self.unlink(node);
        self.kill(node);
        Ok(())
    }

    fn replace_at_usages(&mut self, old: NodeId, new: NodeId) {
        let mut users = std::mem::take(&mut self.nodes[old.index()].usages);
        users.sort_unstable();
        users.dedup();
        for user in users {
            let mut edges = 0;
            for input in &mut self.nodes[user.index()].inputs {
                if *input == old {
                    *input = new;
                    edges += 1;
                }
            }
            for _ in 0..edges {
                self.nodes[new.index()].usages.push(user);
            }
        }
    }

    fn unlink(&mut self, node: NodeId) {
        let pred = self.nodes[node.index()].predecessor.take();
        let next = self.nodes[node.index()].next.take();
        if let Some(pred) = pred {
            self.nodes[pred.index()].next = next;
        }
        if let Some(next) = next {
            self.nodes[next.index()].predecessor = pred;
        }
    }

    fn kill(&mut self, node: NodeId) {
        let inputs = std::mem::take(&mut self.nodes[node.index()].inputs);
        for input in inputs {
            let usages = &mut self.nodes[input.index()].usages;
            if let Some(pos) = usages.iter().position(|&u| u == node) {
                usages.remove(pos);
            }
        }
        let data = &mut self.nodes[node.index()];
        debug_assert!(data.usages.is_empty(), "killing {node:?} with usages");
        data.alive = false;
        if let NodeKind::Constant(constant) = data.kind {
            self.constants.remove(&constant);
        }
    }

    // Checks

    fn check_alive(&self, node: NodeId) -> Result<(), GraphError> {
        if self.is_alive(node) {
            Ok(())
        } else {
            Err(GraphError::DeadNode(node))
        }
    }

    fn check_fixed(&self, node: NodeId) -> Result<(), GraphError> {
        self.check_alive(node)?;
        if self.is_fixed(node) {
            Ok(())
        } else {
            Err(GraphError::NotFixed {
                node,
                kind: self.kind(node).name(),
            })
        }
    }

    fn check_unlinked(&self, node: NodeId) -> Result<(), GraphError> {
        let data = &self.nodes[node.index()];
        if node == self.start || data.predecessor.is_some() || data.next.is_some() {
            Err(GraphError::AlreadyLinked(node))
        } else {
            Ok(())
        }
    }

    fn check_linked_fixed(&self, node: NodeId) -> Result<(), GraphError> {
        self.check_fixed(node)?;
        if self.predecessor(node).is_none() {
            return Err(GraphError::NotLinked(node));
        }
        Ok(())
    }

    // Verification

    /// Check edge symmetry and control-chain consistency.
    ///
    /// Every live fixed node other than `Start` must be on the chain.
    pub fn verify(&self) -> Result<(), GraphError> {
        let inconsistent = |node: NodeId, reason: String| GraphError::Inconsistent { node, reason };

        for id in self.live_nodes() {
            let data = &self.nodes[id.index()];
            for &input in &data.inputs {
                if !self.is_alive(input) {
                    return Err(inconsistent(id, format!("input {input:?} is dead")));
                }
                let forward = data.inputs.iter().filter(|&&i| i == input).count();
                let backward = self.usages(input).iter().filter(|&&u| u == id).count();
                if forward != backward {
                    return Err(inconsistent(
                        id,
                        format!("{forward} edges to {input:?} but {backward} usage entries"),
                    ));
                }
            }
            for &user in &data.usages {
                if !self.is_alive(user) {
                    return Err(inconsistent(id, format!("usage {user:?} is dead")));
                }
                if !self.inputs(user).contains(&id) {
                    return Err(inconsistent(id, format!("{user:?} does not use it")));
                }
            }
            if !data.kind.is_fixed() && (data.predecessor.is_some() || data.next.is_some()) {
                return Err(inconsistent(id, "floating node has control edges".into()));
            }
        }

        let chain = self.fixed_chain();
        for pair in chain.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if !self.is_alive(b) {
                return Err(inconsistent(a, format!("successor {b:?} is dead")));
            }
            if self.predecessor(b) != Some(a) {
                return Err(inconsistent(b, format!("predecessor is not {a:?}")));
            }
        }
        let on_chain = chain.len();
        let live_fixed = self.count_live(NodeKind::is_fixed);
        if on_chain != live_fixed {
            return Err(inconsistent(
                self.start,
                format!("{live_fixed} live fixed nodes but {on_chain} on the control chain"),
            ));
        }
        Ok(())
    }
}
