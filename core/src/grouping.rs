use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{PathError, Result};
use crate::types::{Edge, Label};

/// Which direction of a bidirectional pair is kept as the direct link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationPolicy {
    /// The direction that appears first in the input. Reordering the input
    /// changes which direction gets virtualized.
    #[default]
    FirstSeen,
    /// The direction whose source label orders lower. Independent of input order.
    LowerSource,
}

/// All directed links sharing one unordered endpoint pair.
///
/// A bucket holds one or two links; two links always have opposite orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeBucket<N> {
    pub forward: Edge<N>,
    pub reverse: Option<Edge<N>>,
}

impl<N> EdgeBucket<N> {
    pub fn len(&self) -> usize {
        1 + self.reverse.is_some() as usize
    }

    pub fn is_bidirectional(&self) -> bool {
        self.reverse.is_some()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge<N>> {
        std::iter::once(&self.forward).chain(self.reverse.iter())
    }
}

fn pair_key<N: Label>(a: &N, b: &N) -> (N, N) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Group a directed edge list into same-endpoint buckets.
///
/// Buckets come out in first-appearance order of their endpoint pair.
/// Self-loops, repeated ordered pairs and non-finite weights are rejected.
pub fn group_edges<N: Label>(
    edges: &[Edge<N>],
    policy: OrientationPolicy,
) -> Result<Vec<EdgeBucket<N>>> {
    let mut buckets: Vec<EdgeBucket<N>> = Vec::new();
    let mut index: HashMap<(N, N), usize> = HashMap::with_capacity(edges.len());

    for edge in edges {
        if edge.source == edge.target {
            return Err(PathError::SelfLoop {
                node: format!("{:?}", edge.source),
            });
        }
        if !edge.weight.is_finite() {
            return Err(PathError::NonFiniteWeight {
                from: format!("{:?}", edge.source),
                to: format!("{:?}", edge.target),
                weight: edge.weight,
            });
        }

        let key = pair_key(&edge.source, &edge.target);
        match index.get(&key).copied() {
            Some(i) => {
                let bucket = &mut buckets[i];
                if bucket.forward.source == edge.source || bucket.reverse.is_some() {
                    return Err(PathError::DuplicateLink {
                        from: format!("{:?}", edge.source),
                        to: format!("{:?}", edge.target),
                    });
                }
                bucket.reverse = Some(edge.clone());
            }
            None => {
                index.insert(key, buckets.len());
                buckets.push(EdgeBucket {
                    forward: edge.clone(),
                    reverse: None,
                });
            }
        }
    }

    if policy == OrientationPolicy::LowerSource {
        for bucket in buckets.iter_mut() {
            if let Some(reverse) = bucket.reverse.as_mut() {
                if reverse.source < bucket.forward.source {
                    std::mem::swap(&mut bucket.forward, reverse);
                }
            }
        }
    }

    tracing::debug!(
        buckets = buckets.len(),
        bidirectional = buckets.iter().filter(|b| b.is_bidirectional()).count(),
        ?policy,
        "dipath: grouped links by endpoint pair"
    );

    Ok(buckets)
}
