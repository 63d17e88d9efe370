use std::collections::{BTreeSet, HashMap};

use crate::types::{Label, Link, NodeId};

use super::{
    DegreeConstraint, EdgeIdx, EdgeSet, EngineError, EnumerationEngine, SubgraphFamily,
    SubgraphQuery,
};

/// A family stored member by member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitFamily {
    graphs: BTreeSet<EdgeSet>,
}

impl ExplicitFamily {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &BTreeSet<EdgeSet> {
        &self.graphs
    }

    fn filtered<F: Fn(&EdgeSet) -> bool>(&self, keep: F) -> Self {
        Self {
            graphs: self.graphs.iter().filter(|g| keep(g)).cloned().collect(),
        }
    }

    /// Members sorted by weight; ties fall back to set order so runs are repeatable.
    fn ranked(&self, weights: &[f64], descending: bool) -> Vec<EdgeSet> {
        let mut scored: Vec<(f64, &EdgeSet)> =
            self.graphs.iter().map(|g| (g.weight(weights), g)).collect();
        scored.sort_by(|a, b| {
            let by_weight = if descending { b.0.total_cmp(&a.0) } else { a.0.total_cmp(&b.0) };
            by_weight.then_with(|| a.1.cmp(b.1))
        });
        scored.into_iter().map(|(_, g)| g.clone()).collect()
    }
}

impl FromIterator<EdgeSet> for ExplicitFamily {
    fn from_iter<I: IntoIterator<Item = EdgeSet>>(iter: I) -> Self {
        Self {
            graphs: iter.into_iter().collect(),
        }
    }
}

impl SubgraphFamily for ExplicitFamily {
    fn len(&self) -> usize {
        self.graphs.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = EdgeSet> + '_> {
        Box::new(self.graphs.iter().cloned())
    }

    fn contains(&self, set: &EdgeSet) -> bool {
        self.graphs.contains(set)
    }

    fn excluding(&self, forbidden: &Self) -> Self {
        self.filtered(|g| !forbidden.graphs.iter().any(|f| f.is_subset(g)))
    }

    fn including(&self, required: &Self) -> Self {
        self.filtered(|g| required.graphs.iter().any(|r| r.is_subset(g)))
    }

    fn union(&self, other: &Self) -> Self {
        Self {
            graphs: self.graphs.union(&other.graphs).cloned().collect(),
        }
    }

    fn difference(&self, other: &Self) -> Self {
        Self {
            graphs: self.graphs.difference(&other.graphs).cloned().collect(),
        }
    }

    fn graph_size(&self, size: usize) -> Self {
        self.filtered(|g| g.len() == size)
    }

    fn choice(&self) -> Option<EdgeSet> {
        self.graphs.iter().next().cloned()
    }

    fn min_iter(&self, weights: &[f64]) -> Box<dyn Iterator<Item = EdgeSet> + '_> {
        Box::new(self.ranked(weights, false).into_iter())
    }

    fn max_iter(&self, weights: &[f64]) -> Box<dyn Iterator<Item = EdgeSet> + '_> {
        Box::new(self.ranked(weights, true).into_iter())
    }
}

/// Installed ground set: vertices interned to dense indices.
#[derive(Debug)]
struct Universe<N> {
    vertices: HashMap<NodeId<N>, usize>,
    endpoints: Vec<(usize, usize)>,
    adjacency: Vec<Vec<(usize, EdgeIdx)>>,
}

impl<N: Label> Universe<N> {
    fn build(links: &[Link<N>]) -> Self {
        let mut vertices: HashMap<NodeId<N>, usize> = HashMap::new();
        let mut adjacency: Vec<Vec<(usize, EdgeIdx)>> = Vec::new();
        let mut endpoints = Vec::with_capacity(links.len());

        let mut intern = |node: &NodeId<N>, adjacency: &mut Vec<Vec<(usize, EdgeIdx)>>| -> usize {
            if let Some(&v) = vertices.get(node) {
                return v;
            }
            let v = adjacency.len();
            adjacency.push(Vec::new());
            vertices.insert(node.clone(), v);
            v
        };

        for (idx, link) in links.iter().enumerate() {
            let a = intern(&link.source, &mut adjacency);
            let b = intern(&link.target, &mut adjacency);
            adjacency[a].push((b, idx));
            adjacency[b].push((a, idx));
            endpoints.push((a, b));
        }

        Self {
            vertices,
            endpoints,
            adjacency,
        }
    }

    fn vertex(&self, node: &NodeId<N>) -> Result<usize, EngineError> {
        self.vertices
            .get(node)
            .copied()
            .ok_or_else(|| EngineError::UnknownVertex(format!("{:?}", node)))
    }

    fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Depth-first enumeration of simple paths; the walk stops at `target`.
    fn collect_paths(
        &self,
        current: usize,
        target: usize,
        visited: &mut [bool],
        stack: &mut Vec<EdgeIdx>,
        out: &mut BTreeSet<EdgeSet>,
    ) {
        if current == target {
            out.insert(stack.iter().copied().collect());
            return;
        }
        for &(next, edge) in &self.adjacency[current] {
            if visited[next] {
                continue;
            }
            visited[next] = true;
            stack.push(edge);
            self.collect_paths(next, target, visited, stack, out);
            stack.pop();
            visited[next] = false;
        }
    }
}

/// Reference engine: enumerates every family member explicitly.
///
/// Exponential in the universe size; meant for tests, small topologies and
/// as the executable statement of the engine contract.
#[derive(Debug)]
pub struct ExplicitEngine<N> {
    universe: Option<Universe<N>>,
}

impl<N> Default for ExplicitEngine<N> {
    fn default() -> Self {
        Self { universe: None }
    }
}

impl<N: Label> ExplicitEngine<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_installed(&self) -> bool {
        self.universe.is_some()
    }

    fn universe(&self) -> Result<&Universe<N>, EngineError> {
        self.universe.as_ref().ok_or(EngineError::UniverseNotInstalled)
    }
}

impl<N: Label> EnumerationEngine<N> for ExplicitEngine<N> {
    type Family = ExplicitFamily;

    fn install_universe(&mut self, links: &[Link<N>]) -> Result<(), EngineError> {
        let universe = Universe::build(links);
        tracing::debug!(
            vertices = universe.vertex_count(),
            edges = universe.endpoints.len(),
            "dipath: explicit engine universe installed"
        );
        self.universe = Some(universe);
        Ok(())
    }

    fn family(&self, subgraphs: Vec<EdgeSet>) -> ExplicitFamily {
        subgraphs.into_iter().collect()
    }

    fn simple_paths(
        &self,
        start: &NodeId<N>,
        target: &NodeId<N>,
    ) -> Result<ExplicitFamily, EngineError> {
        let universe = self.universe()?;
        let s = universe.vertex(start)?;
        let t = universe.vertex(target)?;

        let mut out = BTreeSet::new();
        if s != t {
            let mut visited = vec![false; universe.vertex_count()];
            visited[s] = true;
            universe.collect_paths(s, t, &mut visited, &mut Vec::new(), &mut out);
        }

        tracing::trace!(paths = out.len(), "dipath: simple paths enumerated");
        Ok(ExplicitFamily { graphs: out })
    }

    fn constrained_subgraphs(
        &self,
        query: &SubgraphQuery<N>,
    ) -> Result<ExplicitFamily, EngineError> {
        let universe = self.universe()?;
        let n = universe.vertex_count();

        let mut allowed: Vec<Option<&DegreeConstraint>> = vec![None; n];
        for (node, constraint) in &query.degree_constraints {
            allowed[universe.vertex(node)?] = Some(constraint);
        }

        let groups = query
            .root_groups
            .iter()
            .map(|group| group.iter().map(|v| universe.vertex(v)).collect::<Result<Vec<_>, _>>())
            .collect::<Result<Vec<_>, _>>()?;

        let caps: Vec<usize> = allowed.iter().map(|c| c.map_or(usize::MAX, |c| c.max())).collect();

        // Links touching a degree-0 vertex can never be chosen
        let candidates: Vec<EdgeIdx> = (0..universe.endpoints.len())
            .filter(|&e| {
                let (a, b) = universe.endpoints[e];
                caps[a] > 0 && caps[b] > 0
            })
            .collect();

        let mut search = SubgraphSearch {
            universe,
            num_edges: query.num_edges,
            no_loop: query.no_loop,
            allowed,
            caps,
            groups,
            candidates,
            degrees: vec![0; n],
            chosen: Vec::with_capacity(query.num_edges),
            out: BTreeSet::new(),
        };
        search.run(0);

        tracing::trace!(
            num_edges = query.num_edges,
            subgraphs = search.out.len(),
            "dipath: constrained subgraphs enumerated"
        );
        Ok(ExplicitFamily { graphs: search.out })
    }
}

/// Include/exclude search over candidate links, pruned by degree caps and
/// the remaining edge budget.
struct SubgraphSearch<'a, N> {
    universe: &'a Universe<N>,
    num_edges: usize,
    no_loop: bool,
    allowed: Vec<Option<&'a DegreeConstraint>>,
    caps: Vec<usize>,
    groups: Vec<Vec<usize>>,
    candidates: Vec<EdgeIdx>,
    degrees: Vec<usize>,
    chosen: Vec<EdgeIdx>,
    out: BTreeSet<EdgeSet>,
}

impl<N: Label> SubgraphSearch<'_, N> {
    fn run(&mut self, pos: usize) {
        if self.chosen.len() == self.num_edges {
            if self.accepts() {
                self.out.insert(self.chosen.iter().copied().collect());
            }
            return;
        }
        if self.candidates.len() - pos < self.num_edges - self.chosen.len() {
            return;
        }

        let edge = self.candidates[pos];
        let (a, b) = self.universe.endpoints[edge];
        if self.degrees[a] < self.caps[a] && self.degrees[b] < self.caps[b] {
            self.degrees[a] += 1;
            self.degrees[b] += 1;
            self.chosen.push(edge);
            self.run(pos + 1);
            self.chosen.pop();
            self.degrees[a] -= 1;
            self.degrees[b] -= 1;
        }
        self.run(pos + 1);
    }

    fn accepts(&self) -> bool {
        let degrees_ok = self
            .allowed
            .iter()
            .zip(&self.degrees)
            .all(|(c, &d)| c.map_or(true, |c| c.allows(d)));
        if !degrees_ok {
            return false;
        }

        let mut sets = DisjointSets::new(self.degrees.len());
        for &edge in &self.chosen {
            let (a, b) = self.universe.endpoints[edge];
            if !sets.union(a, b) && self.no_loop {
                return false;
            }
        }

        if self.groups.is_empty() {
            return true;
        }

        let mut group_roots = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let Some(&first) = group.first() else {
                continue;
            };
            let root = sets.find(first);
            if group.iter().any(|&v| sets.find(v) != root) || group_roots.contains(&root) {
                return false;
            }
            group_roots.push(root);
        }

        (0..self.degrees.len())
            .filter(|&v| self.degrees[v] > 0)
            .all(|v| group_roots.contains(&sets.find(v)))
    }
}

/// Union-find over dense vertex indices.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, mut v: usize) -> usize {
        while self.parent[v] != v {
            self.parent[v] = self.parent[self.parent[v]];
            v = self.parent[v];
        }
        v
    }

    /// Returns false when `a` and `b` were already connected.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.parent[ra] = rb;
        true
    }
}
