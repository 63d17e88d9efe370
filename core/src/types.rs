use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Anything usable as a node label: integers, strings, small tuples.
pub trait Label: Clone + Eq + Ord + Hash + fmt::Debug {}

impl<T: Clone + Eq + Ord + Hash + fmt::Debug> Label for T {}

/// Node of the transformed graph.
///
/// `Virtual(a, b)` sits in the middle of the reversed link `a -> b`. It is
/// unique per ordered pair and carries both endpoints, so resolving it back
/// to the original link needs no lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeId<N> {
    Original(N),
    Virtual(N, N),
}

impl<N> NodeId<N> {
    pub fn is_virtual(&self) -> bool {
        matches!(self, NodeId::Virtual(..))
    }

    /// The label of an original node.
    pub fn original(&self) -> Option<&N> {
        match self {
            NodeId::Original(n) => Some(n),
            NodeId::Virtual(..) => None,
        }
    }

    /// The reversed link `(source, target)` a virtual node stands for.
    pub fn split(&self) -> Option<(&N, &N)> {
        match self {
            NodeId::Original(_) => None,
            NodeId::Virtual(a, b) => Some((a, b)),
        }
    }
}

impl<N: fmt::Display> fmt::Display for NodeId<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Original(n) => write!(f, "{}", n),
            NodeId::Virtual(a, b) => write!(f, "{}~{}", a, b),
        }
    }
}

/// A directed link of the input topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge<N> {
    pub source: N,
    pub target: N,
    /// Cost, capacity or probability, depending on the query.
    pub weight: f64,
}

impl<N> Edge<N> {
    pub fn new(source: N, target: N, weight: f64) -> Self {
        Self { source, target, weight }
    }
}

impl<N> From<(N, N, f64)> for Edge<N> {
    fn from((source, target, weight): (N, N, f64)) -> Self {
        Self::new(source, target, weight)
    }
}

/// A link of the transformed (universe) graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Link<N> {
    pub source: NodeId<N>,
    pub target: NodeId<N>,
    pub weight: f64,
}

impl<N: Label> Link<N> {
    pub fn new(source: NodeId<N>, target: NodeId<N>, weight: f64) -> Self {
        Self { source, target, weight }
    }

    /// Shorthand for a link between two original nodes.
    pub fn direct(source: N, target: N, weight: f64) -> Self {
        Self::new(NodeId::Original(source), NodeId::Original(target), weight)
    }

    /// True when either endpoint is a virtual node.
    pub fn is_virtual(&self) -> bool {
        self.source.is_virtual() || self.target.is_virtual()
    }

    /// The zero-cost second half of a split link (virtual node -> original).
    pub fn is_closing(&self) -> bool {
        self.source.is_virtual()
    }

    /// The virtual node this link touches, if any.
    pub fn virtual_node(&self) -> Option<&NodeId<N>> {
        if self.source.is_virtual() {
            Some(&self.source)
        } else if self.target.is_virtual() {
            Some(&self.target)
        } else {
            None
        }
    }

    pub fn touches(&self, node: &NodeId<N>) -> bool {
        &self.source == node || &self.target == node
    }

    /// The endpoint opposite `node`, or None if the link does not touch it.
    pub fn other(&self, node: &NodeId<N>) -> Option<&NodeId<N>> {
        if &self.source == node {
            Some(&self.target)
        } else if &self.target == node {
            Some(&self.source)
        } else {
            None
        }
    }
}
