use std::collections::{BTreeSet, HashSet};

use dipath_core::{
    DirectedPathService, Edge, EdgeSet, Link, LinkProbabilities, NodeId, OrientationPolicy,
    PathError, ServiceConfig, SubgraphFamily,
};
use proptest::prelude::*;

const NODES: u32 = 5;

fn ordered_pairs() -> Vec<(u32, u32)> {
    (0..NODES)
        .flat_map(|a| (0..NODES).filter(move |&b| b != a).map(move |b| (a, b)))
        .collect()
}

fn edges_from_mask(mask: &[bool]) -> Vec<Edge<u32>> {
    ordered_pairs()
        .into_iter()
        .zip(mask)
        .filter(|&(_, &keep)| keep)
        .map(|((a, b), _)| Edge::new(a, b, (a * 10 + b) as f64))
        .collect()
}

/// Every simple directed path, as its sequence of original links.
fn oracle_paths(edges: &[Edge<u32>], start: u32, target: u32) -> BTreeSet<Vec<(u32, u32)>> {
    fn dfs(
        edges: &[Edge<u32>],
        at: u32,
        target: u32,
        visited: &mut HashSet<u32>,
        path: &mut Vec<(u32, u32)>,
        out: &mut BTreeSet<Vec<(u32, u32)>>,
    ) {
        if at == target {
            out.insert(path.clone());
            return;
        }
        for e in edges.iter().filter(|e| e.source == at) {
            if !visited.insert(e.target) {
                continue;
            }
            path.push((e.source, e.target));
            dfs(edges, e.target, target, visited, path, out);
            path.pop();
            visited.remove(&e.target);
        }
    }

    let mut out = BTreeSet::new();
    let mut visited = HashSet::from([start]);
    dfs(edges, start, target, &mut visited, &mut Vec::new(), &mut out);
    out
}

fn as_pairs(path: &[Link<u32>]) -> Vec<(u32, u32)> {
    path.iter()
        .filter_map(|l| Some((*l.source.original()?, *l.target.original()?)))
        .collect()
}

fn enumerated_paths(
    svc: &DirectedPathService<u32>,
    start: u32,
    target: u32,
) -> Option<BTreeSet<Vec<(u32, u32)>>> {
    let paths = match svc.directed_paths(&start, &target) {
        Ok(paths) => paths,
        Err(PathError::UnknownNode(_)) => return None,
        Err(err) => panic!("unexpected error: {err}"),
    };
    Some(
        paths
            .iter()
            .map(|p| as_pairs(&svc.original_path(&svc.walk(&start, &p))))
            .collect(),
    )
}

fn physical(link: (u32, u32)) -> (u32, u32) {
    (link.0.min(link.1), link.0.max(link.1))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn directed_paths_match_brute_force(
        mask in proptest::collection::vec(any::<bool>(), 20),
        start in 0..NODES,
        target in 0..NODES,
    ) {
        prop_assume!(start != target);
        let edges = edges_from_mask(&mask);
        let svc = DirectedPathService::new(edges.clone()).unwrap();

        if let Some(found) = enumerated_paths(&svc, start, target) {
            prop_assert_eq!(found, oracle_paths(&edges, start, target));
        }
    }

    #[test]
    fn orientation_policy_does_not_change_paths(
        mask in proptest::collection::vec(any::<bool>(), 20),
        start in 0..NODES,
        target in 0..NODES,
    ) {
        prop_assume!(start != target);
        let mut edges = edges_from_mask(&mask);
        edges.reverse();
        let config = ServiceConfig {
            orientation: OrientationPolicy::LowerSource,
            ..ServiceConfig::default()
        };
        let lower = DirectedPathService::with_config(edges.clone(), config).unwrap();
        let first = DirectedPathService::new(edges).unwrap();

        prop_assert_eq!(
            enumerated_paths(&lower, start, target),
            enumerated_paths(&first, start, target)
        );
    }

    #[test]
    fn disjoint_paths_share_no_link(
        mask in proptest::collection::vec(any::<bool>(), 20),
        start in 0..NODES,
        target in 0..NODES,
    ) {
        prop_assume!(start != target);
        let svc = DirectedPathService::new(edges_from_mask(&mask)).unwrap();
        let Ok(paths) = svc.directed_paths(&start, &target) else { return Ok(()); };
        let Some(reference) = paths.choice() else { return Ok(()); };

        for p in svc.disjoint_paths(&paths, &reference).iter() {
            prop_assert!(p.is_disjoint(&reference));
        }

        let used: HashSet<(u32, u32)> = as_pairs(&svc.original_path(&svc.walk(&start, &reference)))
            .into_iter()
            .map(physical)
            .collect();
        for p in svc.bidirectionally_disjoint_paths(&paths, &reference).iter() {
            let links = as_pairs(&svc.original_path(&svc.walk(&start, &p)));
            prop_assert!(links.into_iter().all(|l| !used.contains(&physical(l))));
        }
    }

    #[test]
    fn original_path_is_idempotent(
        mask in proptest::collection::vec(any::<bool>(), 20),
        start in 0..NODES,
        target in 0..NODES,
    ) {
        prop_assume!(start != target);
        let svc = DirectedPathService::new(edges_from_mask(&mask)).unwrap();
        let Ok(paths) = svc.directed_paths(&start, &target) else { return Ok(()); };

        for p in paths.iter() {
            let once = svc.original_path(&svc.walk(&start, &p));
            prop_assert!(once.iter().all(|l| !l.is_virtual()));
            prop_assert_eq!(svc.original_path(&once), once.clone());
            // logical weight survives the collapse
            let raw: f64 = svc.topology().resolve(&p).iter().map(|l| l.weight).sum();
            let collapsed: f64 = once.iter().map(|l| l.weight).sum();
            prop_assert!((raw - collapsed).abs() < 1e-9);
        }
    }
}

#[test]
fn single_direction_topology_has_no_virtual_nodes() {
    let edges: Vec<Edge<u32>> =
        vec![Edge::new(0, 1, 1.0), Edge::new(1, 2, 1.0), Edge::new(0, 2, 5.0)];
    let svc = DirectedPathService::new(edges).unwrap();
    assert!(svc.topology().virtual_nodes().is_empty());
    assert_eq!(svc.topology().links().len(), 3);

    let paths = svc.directed_paths(&0, &2).unwrap();
    assert_eq!(paths.len(), 2);
    assert!(svc.directed_paths(&2, &0).unwrap().is_empty());
}

#[test]
fn twenty_link_path_probability_without_underflow() {
    let edges: Vec<Edge<u32>> = (0..20).map(|i| Edge::new(i, i + 1, 1.0)).collect();
    let mut probabilities = LinkProbabilities::new();
    for e in &edges {
        probabilities.insert(e.source, e.target, 1e-6).unwrap();
    }
    let svc = DirectedPathService::new(edges).unwrap();

    let paths = svc.directed_paths(&0, &20).unwrap();
    let only = paths.choice().unwrap();
    let path = svc.walk(&0, &only);
    let value = svc.path_probability(&probabilities, &path).unwrap();

    let product: f64 = std::iter::repeat(1e-6).take(20).product();
    assert!(value > 0.0);
    assert!(((value - product) / product).abs() < 1e-9);
}

#[test]
fn reversed_only_link_is_still_walkable() {
    // Bidirectional pair with a one-way tail: 0 <-> 1 -> 2
    let edges = vec![Edge::new(0, 1, 2.0), Edge::new(1, 0, 3.0), Edge::new(1, 2, 4.0)];
    let svc = DirectedPathService::new(edges).unwrap();

    let back = svc.directed_paths(&1, &0).unwrap();
    assert_eq!(back.len(), 1);
    let walked = svc.walk(&1, &back.choice().unwrap());
    assert_eq!(walked.len(), 2);
    assert_eq!(walked[0].target, NodeId::Virtual(1, 0));
    assert_eq!(svc.original_path(&walked), vec![Link::direct(1, 0, 3.0)]);

    assert!(svc.directed_paths(&2, &0).unwrap().is_empty());
    let forward: Vec<EdgeSet> = svc.directed_paths(&0, &2).unwrap().iter().collect();
    assert_eq!(forward.len(), 1);
}
