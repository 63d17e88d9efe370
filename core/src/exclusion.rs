//! Forbidden link combinations that force every link to be walked forward.
//!
//! The engine enumerates undirected paths, so a path may enter a node
//! through one link and leave through another link that also points into the
//! node. Two rules remove exactly those paths:
//!
//! 1. no link pointing into the start node may be used;
//! 2. at any other node except the target, at most one inbound link may be used.
//!
//! A path that satisfies both leaves the start node on an outbound link. Every
//! later node is entered on an inbound link, so it must be left on an outbound
//! one. Virtual nodes have a single inbound link, which makes their closing
//! link the only way out.

use std::collections::{HashMap, HashSet};

use crate::engine::{DegreeConstraint, EdgeSet};
use crate::error::{PathError, Result};
use crate::topology::Topology;
use crate::types::{Label, NodeId};

/// A batch of forbidden subgraphs, de-duplicated, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ForbiddenSet {
    elements: Vec<EdgeSet>,
    seen: HashSet<EdgeSet>,
}

impl ForbiddenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the element was already present.
    pub fn insert(&mut self, element: EdgeSet) -> bool {
        if !self.seen.insert(element.clone()) {
            return false;
        }
        self.elements.push(element);
        true
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, element: &EdgeSet) -> bool {
        self.seen.contains(element)
    }

    pub fn subgraphs(&self) -> &[EdgeSet] {
        &self.elements
    }

    pub fn iter(&self) -> impl Iterator<Item = &EdgeSet> {
        self.elements.iter()
    }
}

impl Extend<EdgeSet> for ForbiddenSet {
    fn extend<I: IntoIterator<Item = EdgeSet>>(&mut self, iter: I) {
        for element in iter {
            self.insert(element);
        }
    }
}

impl FromIterator<EdgeSet> for ForbiddenSet {
    fn from_iter<I: IntoIterator<Item = EdgeSet>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// Every link into `start`, each as a one-link subgraph.
pub fn inbound_to_source<N: Label>(topology: &Topology<N>, start: &NodeId<N>) -> Vec<EdgeSet> {
    topology.incoming(start).iter().map(|&i| EdgeSet::single(i)).collect()
}

/// Every pair of links into `node`. Empty when the node has fewer than two.
pub fn double_inbound_pairs<N: Label>(topology: &Topology<N>, node: &NodeId<N>) -> Vec<EdgeSet> {
    let inbound = topology.incoming(node);
    let mut pairs = Vec::with_capacity(inbound.len() * inbound.len().saturating_sub(1) / 2);
    for (i, &a) in inbound.iter().enumerate() {
        for &b in &inbound[i + 1..] {
            pairs.push(EdgeSet::pair(a, b));
        }
    }
    pairs
}

/// Check that a (start, target) query names two distinct nodes of the topology.
pub fn validate_terminals<N: Label>(
    topology: &Topology<N>,
    start: &NodeId<N>,
    target: &NodeId<N>,
) -> Result<()> {
    for node in [start, target] {
        if !topology.contains(node) {
            return Err(PathError::UnknownNode(format!("{:?}", node)));
        }
    }
    if start == target {
        return Err(PathError::SameTerminals(format!("{:?}", start)));
    }
    Ok(())
}

/// All subgraphs that put some link against its direction on a
/// `start -> target` path, in one batch.
pub fn invalid_direction_elements<N: Label>(
    topology: &Topology<N>,
    start: &NodeId<N>,
    target: &NodeId<N>,
) -> Result<ForbiddenSet> {
    validate_terminals(topology, start, target)?;

    let mut forbidden: ForbiddenSet = inbound_to_source(topology, start).into_iter().collect();
    let inbound = forbidden.len();

    for node in topology.nodes() {
        if node == start || node == target {
            continue;
        }
        let pairs = double_inbound_pairs(topology, node);
        if !pairs.is_empty() {
            tracing::trace!(node = ?node, pairs = pairs.len(), "dipath: double-inbound pairs");
        }
        forbidden.extend(pairs);
    }

    tracing::debug!(
        start = ?start,
        target = ?target,
        inbound,
        pairs = forbidden.len() - inbound,
        "dipath: built forbidden set"
    );

    Ok(forbidden)
}

/// Degree bounds for subgraphs grown from `start` that stay clear of `target`.
///
/// Virtual nodes are either unused or passed through (0 or 2), the start node
/// has exactly one link, the target none, and every other node at most two.
pub fn degree_constraints<N: Label>(
    topology: &Topology<N>,
    start: &NodeId<N>,
    target: &NodeId<N>,
) -> HashMap<NodeId<N>, DegreeConstraint> {
    topology
        .nodes()
        .iter()
        .map(|node| {
            let constraint = if node.is_virtual() {
                DegreeConstraint::one_of(&[0, 2])
            } else if node == start {
                DegreeConstraint::exactly(1)
            } else if node == target {
                DegreeConstraint::exactly(0)
            } else {
                DegreeConstraint::one_of(&[0, 1, 2])
            };
            (node.clone(), constraint)
        })
        .collect()
}
