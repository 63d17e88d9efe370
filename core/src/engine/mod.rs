//! Contract with the set-enumeration engine.
//!
//! The engine works over a fixed ground set of undirected links (the
//! universe) and returns families of link subsets. It knows nothing about
//! direction; the rest of the crate prunes its output with
//! `SubgraphFamily::excluding`.
//!
//! `ExplicitEngine` is a reference implementation that holds every family
//! member in memory. A symbolic engine can be plugged in behind the same traits.

mod explicit;

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::types::{Label, Link, NodeId};

pub use explicit::{ExplicitEngine, ExplicitFamily};

/// Position of a link in the installed universe.
pub type EdgeIdx = usize;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("enumeration universe is not installed")]
    UniverseNotInstalled,

    #[error("vertex {0} is not part of the universe")]
    UnknownVertex(String),
}

/// A set of universe links: a path, a subgraph or a forbidden element.
///
/// Kept sorted and de-duplicated, so equal sets compare and hash equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeSet(Vec<EdgeIdx>);

impl EdgeSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn single(idx: EdgeIdx) -> Self {
        Self(vec![idx])
    }

    pub fn pair(a: EdgeIdx, b: EdgeIdx) -> Self {
        [a, b].into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, idx: EdgeIdx) -> bool {
        self.0.binary_search(&idx).is_ok()
    }

    /// Every link of `self` is also in `other`.
    pub fn is_subset(&self, other: &EdgeSet) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        let mut rest = other.0.iter();
        'outer: for idx in &self.0 {
            for candidate in rest.by_ref() {
                if candidate == idx {
                    continue 'outer;
                }
                if candidate > idx {
                    return false;
                }
            }
            return false;
        }
        true
    }

    pub fn is_disjoint(&self, other: &EdgeSet) -> bool {
        self.0.iter().all(|idx| !other.contains(*idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = EdgeIdx> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[EdgeIdx] {
        &self.0
    }

    /// Sum of per-link weights; links past the end of `weights` count as zero.
    pub fn weight(&self, weights: &[f64]) -> f64 {
        self.0.iter().map(|&i| weights.get(i).copied().unwrap_or(0.0)).sum()
    }
}

impl FromIterator<EdgeIdx> for EdgeSet {
    fn from_iter<I: IntoIterator<Item = EdgeIdx>>(iter: I) -> Self {
        let mut v: Vec<EdgeIdx> = iter.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        Self(v)
    }
}

impl fmt::Display for EdgeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", idx)?;
        }
        write!(f, "}}")
    }
}

/// Degrees a vertex may take in an enumerated subgraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegreeConstraint(Vec<usize>);

impl DegreeConstraint {
    pub fn exactly(degree: usize) -> Self {
        Self(vec![degree])
    }

    pub fn one_of(degrees: &[usize]) -> Self {
        let mut v = degrees.to_vec();
        v.sort_unstable();
        v.dedup();
        Self(v)
    }

    pub fn allows(&self, degree: usize) -> bool {
        self.0.contains(&degree)
    }

    /// Largest allowed degree (0 for an empty constraint).
    pub fn max(&self) -> usize {
        self.0.last().copied().unwrap_or(0)
    }
}

/// Parameters of a bounded, degree-constrained subgraph enumeration.
#[derive(Debug, Clone)]
pub struct SubgraphQuery<N> {
    /// Each group must lie in one connected component, different groups in
    /// different components, and every component must hold a group.
    pub root_groups: Vec<Vec<NodeId<N>>>,
    /// Reject subgraphs containing a cycle.
    pub no_loop: bool,
    pub num_edges: usize,
    /// Vertices missing from the map are unconstrained.
    pub degree_constraints: HashMap<NodeId<N>, DegreeConstraint>,
}

/// A family of universe subgraphs with the set algebra the core relies on.
pub trait SubgraphFamily: Clone + fmt::Debug {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter(&self) -> Box<dyn Iterator<Item = EdgeSet> + '_>;

    fn contains(&self, set: &EdgeSet) -> bool;

    /// Members that contain no member of `forbidden` as a subset.
    fn excluding(&self, forbidden: &Self) -> Self;

    /// Members that contain at least one member of `required` as a subset.
    fn including(&self, required: &Self) -> Self;

    fn union(&self, other: &Self) -> Self;

    fn difference(&self, other: &Self) -> Self;

    /// Members with exactly `size` links.
    fn graph_size(&self, size: usize) -> Self;

    /// An arbitrary member.
    fn choice(&self) -> Option<EdgeSet>;

    /// Members in ascending order of summed link weight.
    fn min_iter(&self, weights: &[f64]) -> Box<dyn Iterator<Item = EdgeSet> + '_>;

    /// Members in descending order of summed link weight.
    fn max_iter(&self, weights: &[f64]) -> Box<dyn Iterator<Item = EdgeSet> + '_>;
}

/// The enumeration engine. One instance holds one universe.
pub trait EnumerationEngine<N: Label> {
    type Family: SubgraphFamily;

    /// Fix the ground set. Link `i` of `links` becomes edge index `i`.
    /// Installing again replaces the previous universe.
    fn install_universe(&mut self, links: &[Link<N>]) -> Result<(), EngineError>;

    /// Wrap explicit subgraphs into a family.
    fn family(&self, subgraphs: Vec<EdgeSet>) -> Self::Family;

    /// All simple paths between `start` and `target`, ignoring direction.
    fn simple_paths(
        &self,
        start: &NodeId<N>,
        target: &NodeId<N>,
    ) -> Result<Self::Family, EngineError>;

    fn constrained_subgraphs(&self, query: &SubgraphQuery<N>) -> Result<Self::Family, EngineError>;
}
