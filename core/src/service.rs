use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::ServiceConfig;
use crate::engine::{EdgeSet, EnumerationEngine, ExplicitEngine, SubgraphFamily, SubgraphQuery};
use crate::error::{PathError, Result};
use crate::exclusion::{self, ForbiddenSet};
use crate::scoring::{self, LinkProbabilities};
use crate::topology::Topology;
use crate::types::{Edge, Label, Link, NodeId};

type QueryKey<N> = (NodeId<N>, NodeId<N>);

/// Directed queries over one topology.
///
/// The service owns the transformed topology and an engine with that
/// topology installed as its universe. Every query asks the engine for
/// undirected results and removes the ones that walk a link backwards.
///
/// Forbidden sets are cached per (start, target). The cache sits behind a
/// `RefCell`, so a service is not `Sync`; build one per thread.
pub struct DirectedPathService<N: Label, E: EnumerationEngine<N> = ExplicitEngine<N>> {
    topology: Topology<N>,
    engine: E,
    config: ServiceConfig,
    forbidden: RefCell<HashMap<QueryKey<N>, Rc<ForbiddenSet>>>,
}

impl<N: Label> DirectedPathService<N> {
    pub fn new(edges: Vec<Edge<N>>) -> Result<Self> {
        Self::with_config(edges, ServiceConfig::default())
    }

    pub fn with_config(edges: Vec<Edge<N>>, config: ServiceConfig) -> Result<Self> {
        Self::with_engine(edges, config, ExplicitEngine::new())
    }
}

impl<N: Label, E: EnumerationEngine<N>> DirectedPathService<N, E> {
    /// Transform `edges` and install the result into `engine`.
    pub fn with_engine(edges: Vec<Edge<N>>, config: ServiceConfig, mut engine: E) -> Result<Self> {
        config.validate()?;
        let topology = Topology::with_policy(edges, config.orientation)?;
        engine.install_universe(topology.links())?;

        tracing::info!(
            nodes = topology.node_count(),
            links = topology.link_count(),
            virtual_nodes = topology.virtual_nodes().len(),
            "dipath: universe installed"
        );

        Ok(Self {
            topology,
            engine,
            config,
            forbidden: RefCell::new(HashMap::new()),
        })
    }

    pub fn topology(&self) -> &Topology<N> {
        &self.topology
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Number of (start, target) pairs with a cached forbidden set.
    pub fn cached_queries(&self) -> usize {
        self.forbidden.borrow().len()
    }

    pub fn clear_cache(&self) {
        self.forbidden.borrow_mut().clear();
    }

    /// The subgraphs that would take some link against its direction on a
    /// `start -> target` path.
    pub fn invalid_direction_elements(&self, start: &N, target: &N) -> Result<Rc<ForbiddenSet>> {
        let key = (NodeId::Original(start.clone()), NodeId::Original(target.clone()));

        if !self.config.cache_exclusions {
            let built = exclusion::invalid_direction_elements(&self.topology, &key.0, &key.1)?;
            return Ok(Rc::new(built));
        }

        if let Some(hit) = self.forbidden.borrow().get(&key) {
            return Ok(Rc::clone(hit));
        }

        let built = Rc::new(exclusion::invalid_direction_elements(&self.topology, &key.0, &key.1)?);
        let mut cache = self.forbidden.borrow_mut();
        if cache.len() >= self.config.max_cached_queries {
            tracing::warn!(
                entries = cache.len(),
                limit = self.config.max_cached_queries,
                "dipath: forbidden-set cache full, clearing"
            );
            cache.clear();
        }
        cache.insert(key, Rc::clone(&built));
        Ok(built)
    }

    fn forbidden_family(&self, start: &N, target: &N) -> Result<E::Family> {
        let forbidden = self.invalid_direction_elements(start, target)?;
        Ok(self.engine.family(forbidden.subgraphs().to_vec()))
    }

    /// Every simple directed path from `start` to `target`.
    pub fn directed_paths(&self, start: &N, target: &N) -> Result<E::Family> {
        let forbidden = self.forbidden_family(start, target)?;
        let paths = self
            .engine
            .simple_paths(&NodeId::Original(start.clone()), &NodeId::Original(target.clone()))?;
        let directed = paths.excluding(&forbidden);

        tracing::debug!(
            undirected = paths.len(),
            directed = directed.len(),
            "dipath: enumerated directed paths"
        );
        Ok(directed)
    }

    /// Directed paths of exactly `length` logical links leaving `start`
    /// that never touch `target`.
    ///
    /// Each split link on a path costs one extra universe link, so a path
    /// crossing `k` virtual nodes is enumerated with `length + k` links.
    /// Every size from `length` up to `length` plus the number of crossable
    /// virtual nodes is enumerated, and members are kept by their logical
    /// hop count.
    pub fn connected_subgraphs(&self, start: &N, target: &N, length: usize) -> Result<E::Family> {
        if length == 0 {
            return Err(PathError::ZeroLength);
        }
        let forbidden = self.forbidden_family(start, target)?;

        let s = NodeId::Original(start.clone());
        let t = NodeId::Original(target.clone());
        let degrees = exclusion::degree_constraints(&self.topology, &s, &t);
        let query = |num_edges| SubgraphQuery {
            root_groups: vec![vec![s.clone()]],
            no_loop: true,
            num_edges,
            degree_constraints: degrees.clone(),
        };

        let hops = scoring::hop_weights(&self.topology);
        let widest = length + length.min(self.topology.virtual_nodes().len());
        let mut found = self.engine.family(Vec::new());
        for num_edges in length..=widest {
            let class = self.engine.constrained_subgraphs(&query(num_edges))?;
            let logical: Vec<EdgeSet> = class
                .iter()
                .filter(|g| g.weight(&hops).round() as usize == length)
                .collect();
            found = found.union(&self.engine.family(logical));
        }

        Ok(found.excluding(&forbidden))
    }

    /// Members of `paths` sharing no universe link with `reference`.
    pub fn disjoint_paths(&self, paths: &E::Family, reference: &EdgeSet) -> E::Family {
        let used = self.engine.family(reference.iter().map(EdgeSet::single).collect());
        paths.excluding(&used)
    }

    /// Members of `paths` sharing no physical link with `reference`, in
    /// either direction.
    pub fn bidirectionally_disjoint_paths(
        &self,
        paths: &E::Family,
        reference: &EdgeSet,
    ) -> E::Family {
        let used: EdgeSet = reference
            .iter()
            .flat_map(|i| self.topology.bucket_links(i).iter().copied())
            .collect();
        let used = self.engine.family(used.iter().map(EdgeSet::single).collect());
        paths.excluding(&used)
    }

    /// Order an enumerated subgraph as a walk from `start`.
    pub fn walk(&self, start: &N, set: &EdgeSet) -> Vec<Link<N>> {
        self.topology.walk(&NodeId::Original(start.clone()), set)
    }

    pub fn original_path(&self, path: &[Link<N>]) -> Vec<Link<N>> {
        self.topology.original_path(path)
    }

    /// A path with the fewest logical hops, and that hop count.
    pub fn min_hop(&self, start: &N, target: &N) -> Result<Option<(EdgeSet, usize)>> {
        let paths = self.directed_paths(start, target)?;
        let weights = scoring::hop_weights(&self.topology);
        let best = paths.min_iter(&weights).next();
        Ok(best.map(|p| {
            let hops = p.weight(&weights).round() as usize;
            (p, hops)
        }))
    }

    /// A path with the most logical hops, and that hop count.
    pub fn max_hop(&self, start: &N, target: &N) -> Result<Option<(EdgeSet, usize)>> {
        let paths = self.directed_paths(start, target)?;
        let weights = scoring::hop_weights(&self.topology);
        let best = paths.max_iter(&weights).next();
        Ok(best.map(|p| {
            let hops = p.weight(&weights).round() as usize;
            (p, hops)
        }))
    }

    /// The path whose links all succeed with the highest probability.
    ///
    /// `probabilities` must cover every link of the topology, including links
    /// no `start -> target` path uses; a gap fails with `MissingProbability`.
    pub fn most_reliable_path(
        &self,
        start: &N,
        target: &N,
        probabilities: &LinkProbabilities<N>,
    ) -> Result<Option<(EdgeSet, f64)>> {
        let weights = scoring::reliability_weights(&self.topology, probabilities)?;
        let paths = self.directed_paths(start, target)?;
        let best = paths.max_iter(&weights).next();
        Ok(best.map(|p| {
            let probability = 10f64.powf(p.weight(&weights));
            (p, probability)
        }))
    }

    pub fn path_probability(
        &self,
        probabilities: &LinkProbabilities<N>,
        path: &[Link<N>],
    ) -> Result<f64> {
        scoring::path_probability(probabilities, path)
    }
}
