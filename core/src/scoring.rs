use std::collections::HashMap;

use crate::error::{PathError, Result};
use crate::topology::Topology;
use crate::types::{Edge, Label, Link, NodeId};

/// Success probability of each directed link of the original topology.
///
/// Values must lie in (0, 1]. A split link is looked up by the reversed pair
/// its virtual node stands for; the closing half always counts as 1.
#[derive(Debug, Clone, Default)]
pub struct LinkProbabilities<N> {
    values: HashMap<(N, N), f64>,
}

impl<N: Label> LinkProbabilities<N> {
    pub fn new() -> Self {
        Self { values: HashMap::new() }
    }

    /// Read probabilities from the weight field of an edge list.
    pub fn from_edges(edges: &[Edge<N>]) -> Result<Self> {
        let mut probabilities = Self::new();
        for edge in edges {
            probabilities.insert(edge.source.clone(), edge.target.clone(), edge.weight)?;
        }
        Ok(probabilities)
    }

    pub fn insert(&mut self, source: N, target: N, value: f64) -> Result<()> {
        if !(value > 0.0 && value <= 1.0) {
            return Err(PathError::ProbabilityDomain {
                link: format!("{:?} -> {:?}", source, target),
                value,
            });
        }
        self.values.insert((source, target), value);
        Ok(())
    }

    pub fn get(&self, source: &N, target: &N) -> Option<f64> {
        self.values.get(&(source.clone(), target.clone())).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// log10 of the probability of one universe link.
    pub fn log_probability(&self, link: &Link<N>) -> Result<f64> {
        if link.is_closing() {
            return Ok(0.0);
        }
        let (source, target) = match (&link.source, &link.target) {
            (NodeId::Original(a), NodeId::Virtual(va, vb)) if a == va => (va, vb),
            (NodeId::Original(a), NodeId::Original(b)) => (a, b),
            _ => {
                let name = format!("{:?} -> {:?}", link.source, link.target);
                return Err(PathError::MissingProbability(name));
            }
        };
        self.get(source, target)
            .map(f64::log10)
            .ok_or_else(|| PathError::MissingProbability(format!("{:?} -> {:?}", source, target)))
    }
}

/// Probability that every link of `path` succeeds.
///
/// Summed as common logarithms so long paths of small probabilities do not
/// underflow before the final power.
pub fn path_probability<N: Label>(
    probabilities: &LinkProbabilities<N>,
    path: &[Link<N>],
) -> Result<f64> {
    let mut log_sum = 0.0;
    for link in path {
        log_sum += probabilities.log_probability(link)?;
    }
    Ok(10f64.powf(log_sum))
}

/// Per-link log10 probabilities over the universe. Maximising the summed
/// weight finds the most reliable path.
pub fn reliability_weights<N: Label>(
    topology: &Topology<N>,
    probabilities: &LinkProbabilities<N>,
) -> Result<Vec<f64>> {
    topology.links().iter().map(|l| probabilities.log_probability(l)).collect()
}

/// The input weight of each universe link (closing links carry 0).
pub fn cost_weights<N: Label>(topology: &Topology<N>) -> Vec<f64> {
    topology.links().iter().map(|l| l.weight).collect()
}

/// One per logical hop: a split link counts once, its closing half is free.
pub fn hop_weights<N: Label>(topology: &Topology<N>) -> Vec<f64> {
    topology.links().iter().map(|l| if l.is_closing() { 0.0 } else { 1.0 }).collect()
}

pub fn total_cost<N: Label>(path: &[Link<N>]) -> f64 {
    path.iter().map(|l| l.weight).sum()
}
