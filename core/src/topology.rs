use std::collections::HashMap;

use crate::engine::{EdgeIdx, EdgeSet};
use crate::error::Result;
use crate::grouping::{group_edges, EdgeBucket, OrientationPolicy};
use crate::types::{Edge, Label, Link, NodeId};

/// A directed topology rewritten for an undirected enumerator.
///
/// Each bucket contributes its forward edge unchanged. A reverse edge
/// `a -> b` becomes `a -> Virtual(a, b)` (with its weight) followed by
/// `Virtual(a, b) -> b` (weight 0). The resulting link list is the engine
/// universe: link `i` is engine edge `i`.
///
/// Links are indexed in both directions: `incoming[n]` holds the links
/// ending at n, `outgoing[n]` the links leaving n.
#[derive(Debug, Clone)]
pub struct Topology<N> {
    edges: Vec<Edge<N>>,
    buckets: Vec<EdgeBucket<N>>,
    policy: OrientationPolicy,
    links: Vec<Link<N>>,
    link_bucket: Vec<usize>,
    bucket_links: Vec<Vec<EdgeIdx>>,
    index: HashMap<(NodeId<N>, NodeId<N>), EdgeIdx>,
    incoming: HashMap<NodeId<N>, Vec<EdgeIdx>>,
    outgoing: HashMap<NodeId<N>, Vec<EdgeIdx>>,
    nodes: Vec<NodeId<N>>,
    virtual_nodes: Vec<NodeId<N>>,
}

impl<N: Label> Topology<N> {
    /// Build with the default orientation policy (first-seen direction stays direct).
    pub fn new(edges: Vec<Edge<N>>) -> Result<Self> {
        Self::with_policy(edges, OrientationPolicy::default())
    }

    /// Bulk load from `(source, target, weight)` triples.
    pub fn from_triples<I>(triples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, N, f64)>,
    {
        Self::new(triples.into_iter().map(Edge::from).collect())
    }

    pub fn with_policy(edges: Vec<Edge<N>>, policy: OrientationPolicy) -> Result<Self> {
        let buckets = group_edges(&edges, policy)?;
        let link_capacity: usize = buckets
            .iter()
            .map(|b| if b.is_bidirectional() { 3 } else { 1 })
            .sum();

        let mut topology = Self {
            edges: Vec::new(),
            buckets: Vec::new(),
            policy,
            links: Vec::with_capacity(link_capacity),
            link_bucket: Vec::with_capacity(link_capacity),
            bucket_links: Vec::with_capacity(buckets.len()),
            index: HashMap::with_capacity(link_capacity),
            incoming: HashMap::new(),
            outgoing: HashMap::new(),
            nodes: Vec::new(),
            virtual_nodes: Vec::new(),
        };

        for (b, bucket) in buckets.iter().enumerate() {
            let fwd = &bucket.forward;
            topology.push_link(b, Link::direct(fwd.source.clone(), fwd.target.clone(), fwd.weight));

            if let Some(rev) = &bucket.reverse {
                let v = NodeId::Virtual(rev.source.clone(), rev.target.clone());
                let entry = Link::new(NodeId::Original(rev.source.clone()), v.clone(), rev.weight);
                let closing = Link::new(v.clone(), NodeId::Original(rev.target.clone()), 0.0);
                topology.push_link(b, entry);
                topology.push_link(b, closing);
                topology.virtual_nodes.push(v);
            }
        }

        topology.edges = edges;
        topology.buckets = buckets;

        tracing::debug!(
            edges = topology.edges.len(),
            links = topology.links.len(),
            virtual_nodes = topology.virtual_nodes.len(),
            "dipath: topology transformed"
        );

        Ok(topology)
    }

    fn push_link(&mut self, bucket: usize, link: Link<N>) {
        let idx = self.links.len();

        for node in [&link.source, &link.target] {
            if !self.incoming.contains_key(node) && !self.outgoing.contains_key(node) {
                self.nodes.push(node.clone());
            }
        }

        self.index.insert((link.source.clone(), link.target.clone()), idx);
        self.outgoing.entry(link.source.clone()).or_default().push(idx);
        self.incoming.entry(link.target.clone()).or_default().push(idx);

        if bucket == self.bucket_links.len() {
            self.bucket_links.push(Vec::new());
        }
        self.bucket_links[bucket].push(idx);
        self.link_bucket.push(bucket);
        self.links.push(link);
    }

    pub fn policy(&self) -> OrientationPolicy {
        self.policy
    }

    /// The input edge list, as given.
    pub fn original_edges(&self) -> &[Edge<N>] {
        &self.edges
    }

    pub fn buckets(&self) -> &[EdgeBucket<N>] {
        &self.buckets
    }

    /// The transformed link list (the engine universe).
    pub fn links(&self) -> &[Link<N>] {
        &self.links
    }

    pub fn link(&self, idx: EdgeIdx) -> Option<&Link<N>> {
        self.links.get(idx)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Every node of the transformed graph, in first-appearance order.
    pub fn nodes(&self) -> &[NodeId<N>] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn original_nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.iter().filter_map(|n| n.original())
    }

    pub fn virtual_nodes(&self) -> &[NodeId<N>] {
        &self.virtual_nodes
    }

    pub fn contains(&self, node: &NodeId<N>) -> bool {
        self.incoming.contains_key(node) || self.outgoing.contains_key(node)
    }

    /// Index of the directed link `source -> target`.
    pub fn link_index(&self, source: &NodeId<N>, target: &NodeId<N>) -> Option<EdgeIdx> {
        self.index.get(&(source.clone(), target.clone())).copied()
    }

    /// Links ending at `node`.
    pub fn incoming(&self, node: &NodeId<N>) -> &[EdgeIdx] {
        self.incoming.get(node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Links leaving `node`.
    pub fn outgoing(&self, node: &NodeId<N>) -> &[EdgeIdx] {
        self.outgoing.get(node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn predecessors(&self, node: &NodeId<N>) -> Vec<&NodeId<N>> {
        self.incoming(node).iter().map(|&i| &self.links[i].source).collect()
    }

    pub fn successors(&self, node: &NodeId<N>) -> Vec<&NodeId<N>> {
        self.outgoing(node).iter().map(|&i| &self.links[i].target).collect()
    }

    /// Undirected degree in the universe.
    pub fn degree(&self, node: &NodeId<N>) -> usize {
        self.incoming(node).len() + self.outgoing(node).len()
    }

    /// The (entry, closing) links through a virtual node.
    pub fn virtual_links(&self, node: &NodeId<N>) -> Option<(EdgeIdx, EdgeIdx)> {
        let (a, b) = node.split()?;
        let entry = self.link_index(&NodeId::Original(a.clone()), node)?;
        let closing = self.link_index(node, &NodeId::Original(b.clone()))?;
        Some((entry, closing))
    }

    /// Two one-link subgraphs per virtual node: its entry and its closing link.
    pub fn virtual_edges(&self) -> Vec<EdgeSet> {
        self.virtual_nodes
            .iter()
            .filter_map(|v| self.virtual_links(v))
            .flat_map(|(entry, closing)| [EdgeSet::single(entry), EdgeSet::single(closing)])
            .collect()
    }

    /// Every link standing for the same physical link as `idx`: the direct
    /// link and, for a bidirectional pair, both virtual segments.
    pub fn bucket_links(&self, idx: EdgeIdx) -> &[EdgeIdx] {
        self.link_bucket
            .get(idx)
            .map(|&b| self.bucket_links[b].as_slice())
            .unwrap_or(&[])
    }

    pub fn resolve(&self, set: &EdgeSet) -> Vec<&Link<N>> {
        set.iter().filter_map(|i| self.links.get(i)).collect()
    }

    /// Look up a subgraph by its directed node pairs. None if any pair is missing.
    pub fn subgraph(&self, pairs: &[(NodeId<N>, NodeId<N>)]) -> Option<EdgeSet> {
        pairs
            .iter()
            .map(|(s, t)| self.link_index(s, t))
            .collect::<Option<Vec<_>>>()
            .map(EdgeSet::from_iter)
    }

    /// Order the links of `set` as a walk from `start`.
    ///
    /// Links the walk cannot reach are appended in index order.
    pub fn walk(&self, start: &NodeId<N>, set: &EdgeSet) -> Vec<Link<N>> {
        let mut remaining: Vec<EdgeIdx> = set.iter().filter(|&i| i < self.links.len()).collect();
        let mut ordered = Vec::with_capacity(remaining.len());
        let mut current = start.clone();

        while let Some(pos) = remaining.iter().position(|&i| self.links[i].touches(&current)) {
            let link = &self.links[remaining.remove(pos)];
            if let Some(next) = link.other(&current) {
                current = next.clone();
            }
            ordered.push(link.clone());
        }

        ordered.extend(remaining.into_iter().map(|i| self.links[i].clone()));
        ordered
    }

    /// Collapse every step through a virtual node into the reversed link it
    /// stands for. Links between original nodes are kept in place.
    pub fn original_path(&self, path: &[Link<N>]) -> Vec<Link<N>> {
        let mut collapsed: Vec<&NodeId<N>> = Vec::new();
        let mut out = Vec::with_capacity(path.len());

        for link in path {
            let Some(v) = link.virtual_node() else {
                out.push(link.clone());
                continue;
            };
            if collapsed.contains(&v) {
                continue;
            }
            collapsed.push(v);

            if let Some((a, b)) = v.split() {
                let weight = self
                    .virtual_links(v)
                    .map(|(entry, closing)| self.links[entry].weight + self.links[closing].weight)
                    .unwrap_or(link.weight);
                out.push(Link::direct(a.clone(), b.clone(), weight));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{chain, square};

    fn o(n: u32) -> NodeId<u32> {
        NodeId::Original(n)
    }

    fn v(a: u32, b: u32) -> NodeId<u32> {
        NodeId::Virtual(a, b)
    }

    #[test]
    fn test_square_links() {
        let t = Topology::new(square()).unwrap();
        let links: Vec<(NodeId<u32>, NodeId<u32>, f64)> =
            t.links().iter().map(|l| (l.source.clone(), l.target.clone(), l.weight)).collect();
        assert_eq!(
            links,
            vec![
                (o(1), o(2), 10.0),
                (o(2), v(2, 1), 10.0),
                (v(2, 1), o(1), 0.0),
                (o(1), o(3), 20.0),
                (o(3), v(3, 1), 20.0),
                (v(3, 1), o(1), 0.0),
                (o(2), o(3), 30.0),
                (o(3), v(3, 2), 30.0),
                (v(3, 2), o(2), 0.0),
                (o(2), o(4), 40.0),
                (o(4), v(4, 2), 40.0),
                (v(4, 2), o(2), 0.0),
                (o(3), o(4), 50.0),
                (o(4), v(4, 3), 50.0),
                (v(4, 3), o(3), 0.0),
            ]
        );
    }

    #[test]
    fn test_virtual_nodes_and_edges() {
        let t = Topology::new(square()).unwrap();
        assert_eq!(t.virtual_nodes(), &[v(2, 1), v(3, 1), v(3, 2), v(4, 2), v(4, 3)]);

        let expected: Vec<EdgeSet> = [1, 2, 4, 5, 7, 8, 10, 11, 13, 14]
            .into_iter()
            .map(EdgeSet::single)
            .collect();
        assert_eq!(t.virtual_edges(), expected);
        assert_eq!(t.virtual_links(&v(3, 2)), Some((7, 8)));
        assert_eq!(t.virtual_links(&o(3)), None);
    }

    #[test]
    fn test_nodes_in_first_appearance_order() {
        let t = Topology::new(square()).unwrap();
        assert_eq!(
            t.nodes(),
            &[o(1), o(2), v(2, 1), o(3), v(3, 1), v(3, 2), o(4), v(4, 2), v(4, 3)]
        );
        assert_eq!(t.original_nodes().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(t.node_count(), 9);
    }

    #[test]
    fn test_predecessors() {
        let t = Topology::new(square()).unwrap();
        assert_eq!(t.predecessors(&o(1)), vec![&v(2, 1), &v(3, 1)]);
        assert_eq!(t.predecessors(&o(2)), vec![&o(1), &v(3, 2), &v(4, 2)]);
        assert_eq!(t.predecessors(&o(3)), vec![&o(1), &o(2), &v(4, 3)]);
        assert_eq!(t.predecessors(&o(4)), vec![&o(2), &o(3)]);
        assert_eq!(t.predecessors(&v(4, 3)), vec![&o(4)]);
    }

    #[test]
    fn test_successors_and_degree() {
        let t = Topology::new(square()).unwrap();
        assert_eq!(t.successors(&o(2)), vec![&v(2, 1), &o(3), &o(4)]);
        assert_eq!(t.successors(&o(4)), vec![&v(4, 2), &v(4, 3)]);
        assert_eq!(t.degree(&o(1)), 4);
        assert_eq!(t.degree(&v(2, 1)), 2);
        assert_eq!(t.degree(&o(9)), 0);
        assert!(!t.contains(&o(9)));
    }

    #[test]
    fn test_single_direction_kept_as_is() {
        let t = Topology::new(chain(3)).unwrap();
        assert_eq!(t.link_count(), 2);
        assert!(t.virtual_nodes().is_empty());
        assert!(t.virtual_edges().is_empty());
        assert_eq!(t.link_index(&o(0), &o(1)), Some(0));
        assert_eq!(t.link_index(&o(1), &o(0)), None);
    }

    #[test]
    fn test_bucket_links() {
        let t = Topology::new(square()).unwrap();
        assert_eq!(t.bucket_links(0), &[0, 1, 2]);
        assert_eq!(t.bucket_links(11), &[9, 10, 11]);
        assert!(t.bucket_links(99).is_empty());

        let c = Topology::new(chain(3)).unwrap();
        assert_eq!(c.bucket_links(1), &[1]);
    }

    #[test]
    fn test_lower_source_matches_forward_input() {
        let mut reversed = square();
        reversed.reverse();
        let a = Topology::with_policy(reversed, OrientationPolicy::LowerSource).unwrap();
        let b = Topology::new(square()).unwrap();
        // Same split decisions; bucket order differs with input order
        let mut va = a.virtual_nodes().to_vec();
        va.sort();
        let mut vb = b.virtual_nodes().to_vec();
        vb.sort();
        assert_eq!(va, vb);
        assert_eq!(a.policy(), OrientationPolicy::LowerSource);
    }

    #[test]
    fn test_first_seen_depends_on_input_order() {
        let mut reversed = square();
        reversed.reverse();
        let t = Topology::new(reversed).unwrap();
        // (4,3) came first, so 3 -> 4 is the virtualized direction
        assert!(t.virtual_nodes().contains(&v(3, 4)));
        assert!(!t.virtual_nodes().contains(&v(4, 3)));
    }

    #[test]
    fn test_walk_orders_from_start() {
        let t = Topology::new(square()).unwrap();
        let set: EdgeSet = [9, 3, 8, 7].into_iter().collect();
        let walked = t.walk(&o(1), &set);
        let steps: Vec<(NodeId<u32>, NodeId<u32>)> =
            walked.iter().map(|l| (l.source.clone(), l.target.clone())).collect();
        assert_eq!(
            steps,
            vec![(o(1), o(3)), (o(3), v(3, 2)), (v(3, 2), o(2)), (o(2), o(4))]
        );
    }

    #[test]
    fn test_original_path_collapses_virtual_steps() {
        let t = Topology::new(square()).unwrap();
        let path = vec![
            Link::new(o(4), v(4, 3), 50.0),
            Link::new(v(4, 3), o(3), 0.0),
            Link::new(o(3), v(3, 1), 20.0),
            Link::new(v(3, 1), o(1), 0.0),
        ];
        assert_eq!(
            t.original_path(&path),
            vec![Link::direct(4, 3, 50.0), Link::direct(3, 1, 20.0)]
        );
    }

    #[test]
    fn test_original_path_keeps_order_around_virtual_step() {
        let t = Topology::new(square()).unwrap();
        let path = vec![
            Link::direct(1, 3, 20.0),
            Link::new(o(3), v(3, 2), 30.0),
            Link::new(v(3, 2), o(2), 0.0),
            Link::direct(2, 4, 40.0),
        ];
        assert_eq!(
            t.original_path(&path),
            vec![Link::direct(1, 3, 20.0), Link::direct(3, 2, 30.0), Link::direct(2, 4, 40.0)]
        );
    }

    #[test]
    fn test_original_path_idempotent_without_virtual_nodes() {
        let t = Topology::new(square()).unwrap();
        let path = vec![
            Link::direct(1, 2, 10.0),
            Link::direct(2, 3, 30.0),
            Link::direct(3, 4, 50.0),
        ];
        assert_eq!(t.original_path(&path), path);
        let split = [Link::new(o(4), v(4, 2), 40.0), Link::new(v(4, 2), o(2), 0.0)];
        let once = t.original_path(&split);
        assert_eq!(t.original_path(&once), once);
    }

    #[test]
    fn test_subgraph_lookup() {
        let t = Topology::new(square()).unwrap();
        assert_eq!(t.subgraph(&[(o(1), o(2)), (o(2), o(4))]), Some(EdgeSet::pair(0, 9)));
        assert_eq!(t.subgraph(&[(o(2), o(1))]), None);
        let set = EdgeSet::pair(0, 9);
        let resolved = t.resolve(&set);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[1].target, o(4));
    }

    #[test]
    fn test_string_labels() {
        let triples = vec![("a", "b", 1.0), ("b", "a", 2.0), ("b", "c", 3.0)];
        let t = Topology::from_triples(triples).unwrap();
        assert_eq!(t.link_count(), 4);
        assert_eq!(t.virtual_nodes(), &[NodeId::Virtual("b", "a")]);
        assert_eq!(t.original_edges().len(), 3);
        assert_eq!(t.buckets().len(), 2);
    }

    #[test]
    fn test_malformed_input_rejected() {
        assert!(Topology::from_triples(vec![(1u32, 1u32, 1.0)]).is_err());
        assert!(Topology::from_triples(vec![(1u32, 2u32, 1.0), (1, 2, 1.0)]).is_err());
    }
}
