use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use dipath_core::{DirectedPathService, Edge, LinkProbabilities, ServiceConfig, SubgraphFamily};

#[derive(Parser)]
#[command(name = "dipath-bench")]
#[command(about = "Time directed path queries on generated topologies")]
struct Args {
    /// Topology generator
    #[arg(value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Generator size: grid side, ring length, random node count or clique size
    #[arg(long, default_value_t = 4)]
    size: u32,

    /// JSON edge list to benchmark instead of a generator
    #[arg(long)]
    topology: Option<PathBuf>,

    /// JSON service config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Query start node (defaults to the first node)
    #[arg(long)]
    start: Option<u32>,

    /// Query target node (defaults to the last node)
    #[arg(long)]
    target: Option<u32>,

    /// Longest connected subgraph to enumerate
    #[arg(long, default_value_t = 2)]
    max_length: usize,

    /// Lowest random link success probability
    #[arg(long, default_value_t = 0.9)]
    pmin: f64,

    /// Highest random link success probability
    #[arg(long, default_value_t = 0.99)]
    pmax: f64,

    #[arg(long, default_value_t = tracing::Level::WARN)]
    log_level: tracing::Level,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Run every generator (default)
    All,
    /// Square lattice, most links in both directions
    Grid,
    /// Cycle with one-way chords
    Ring,
    /// Uniform random directed links
    Random,
    /// Two dense cliques joined by a one-way bridge
    Barbell,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(false)
        .init();

    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ServiceConfig::from_json(&json)?
        }
        None => ServiceConfig::default(),
    };

    println!("dipath-bench");
    println!("============");
    println!();

    if let Some(path) = &args.topology {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let edges: Vec<Edge<u32>> = serde_json::from_str(&json).context("parsing edge list")?;
        return run_benchmark(&path.display().to_string(), edges, &config, &args);
    }

    let generators: Vec<(&str, fn(u32) -> Vec<Edge<u32>>)> = match args.mode {
        Mode::Grid => vec![("Grid (mostly bidirectional)", gen_grid)],
        Mode::Ring => vec![("Ring with one-way chords", gen_ring)],
        Mode::Random => vec![("Random directed", gen_random)],
        Mode::Barbell => vec![("Barbell (clique-bridge-clique)", gen_barbell)],
        Mode::All => vec![
            ("Grid (mostly bidirectional)", gen_grid as fn(u32) -> Vec<Edge<u32>>),
            ("Ring with one-way chords", gen_ring),
            ("Random directed", gen_random),
            ("Barbell (clique-bridge-clique)", gen_barbell),
        ],
    };

    for (name, generator) in generators {
        run_benchmark(name, generator(args.size), &config, &args)?;
    }
    Ok(())
}

fn run_benchmark(
    name: &str,
    edges: Vec<Edge<u32>>,
    config: &ServiceConfig,
    args: &Args,
) -> Result<()> {
    println!("--- {} ---", name);

    let probabilities = random_probabilities(&edges, args.pmin, args.pmax)?;

    let t = Instant::now();
    let svc = DirectedPathService::with_config(edges, config.clone())?;
    let topology = svc.topology();
    println!(
        "Transformed in {:.2}ms: {} links -> {} universe links, {} virtual nodes",
        t.elapsed().as_secs_f64() * 1000.0,
        topology.original_edges().len(),
        topology.link_count(),
        topology.virtual_nodes().len()
    );

    let nodes: Vec<u32> = topology.original_nodes().copied().collect();
    let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) else {
        println!("(empty topology)");
        println!();
        return Ok(());
    };
    let start = args.start.unwrap_or(first);
    let target = args.target.unwrap_or(last);
    if start == target {
        bail!("start and target are both {}", start);
    }

    println!("Query {} -> {}", start, target);
    println!();
    println!("{:>28} {:>10} {:>10}", "query", "results", "time");
    println!("{:->28} {:->10} {:->10}", "", "", "");

    let t = Instant::now();
    let forbidden = svc.invalid_direction_elements(&start, &target)?;
    row("forbidden subgraphs", forbidden.len(), t);

    let t = Instant::now();
    let paths = svc.directed_paths(&start, &target)?;
    row("directed paths", paths.len(), t);

    if let Some(reference) = paths.choice() {
        let t = Instant::now();
        let disjoint = svc.disjoint_paths(&paths, &reference);
        row("link-disjoint", disjoint.len(), t);

        let t = Instant::now();
        let bidirectional = svc.bidirectionally_disjoint_paths(&paths, &reference);
        row("physically disjoint", bidirectional.len(), t);
    }

    let t = Instant::now();
    let hops = svc.min_hop(&start, &target)?.map_or(0, |(_, h)| h);
    row("min hop count", hops, t);

    let t = Instant::now();
    let hops = svc.max_hop(&start, &target)?.map_or(0, |(_, h)| h);
    row("max hop count", hops, t);

    for length in 1..=args.max_length {
        let t = Instant::now();
        let trees = svc.connected_subgraphs(&start, &target, length)?;
        row(&format!("connected subgraphs (len {})", length), trees.len(), t);
    }

    let t = Instant::now();
    match svc.most_reliable_path(&start, &target, &probabilities)? {
        Some((path, probability)) => {
            let walked = svc.original_path(&svc.walk(&start, &path));
            println!(
                "Most reliable: {} links, p = {:.6} ({:.1}ms)",
                walked.len(),
                probability,
                t.elapsed().as_secs_f64() * 1000.0
            );
        }
        None => println!("Most reliable: no path ({:.1}ms)", t.elapsed().as_secs_f64() * 1000.0),
    }
    println!();
    Ok(())
}

fn row(query: &str, results: usize, t: Instant) {
    println!("{:>28} {:>10} {:>8.1}ms", query, results, t.elapsed().as_secs_f64() * 1000.0);
}

/// One probability per link, drawn uniformly from `[pmin, pmax]`.
fn random_probabilities(
    edges: &[Edge<u32>],
    pmin: f64,
    pmax: f64,
) -> Result<LinkProbabilities<u32>> {
    if !(pmin > 0.0 && pmax <= 1.0 && pmin <= pmax) {
        bail!("probability range [{}, {}] must satisfy 0 < pmin <= pmax <= 1", pmin, pmax);
    }
    let mut rng = FastRng::new(7);
    let mut probabilities = LinkProbabilities::new();
    for e in edges {
        probabilities.insert(e.source, e.target, pmin + (pmax - pmin) * rng.next_f64())?;
    }
    Ok(probabilities)
}

// ---------------------------------------------------------------------------
// Generators: deterministic, small enough for explicit enumeration
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
    fn weight(&mut self) -> f64 {
        (1 + self.next(100)) as f64
    }
}

/// `side x side` lattice numbered row by row from 1.
///
/// Every lattice link runs left-to-right or top-to-bottom; about 70% also get
/// the reverse direction with its own weight.
fn gen_grid(side: u32) -> Vec<Edge<u32>> {
    let mut rng = FastRng::new(42);
    let mut edges = Vec::new();
    let side = side.max(2);

    for v in 1..=side * side {
        let mut neighbors = Vec::with_capacity(2);
        if v % side != 0 {
            neighbors.push(v + 1);
        }
        if v <= (side - 1) * side {
            neighbors.push(v + side);
        }
        for w in neighbors {
            edges.push(Edge::new(v, w, rng.weight()));
            if rng.next_f64() < 0.7 {
                edges.push(Edge::new(w, v, rng.weight()));
            }
        }
    }
    edges
}

/// Bidirectional cycle plus a one-way chord from every third node.
fn gen_ring(n: u32) -> Vec<Edge<u32>> {
    let mut rng = FastRng::new(12345);
    let n = n.max(3) * 2;
    let mut edges = Vec::new();

    for i in 0..n {
        let j = (i + 1) % n;
        edges.push(Edge::new(i, j, rng.weight()));
        edges.push(Edge::new(j, i, rng.weight()));
    }
    for i in (0..n).step_by(3) {
        let j = (i + n / 2) % n;
        if j != (i + 1) % n && i != (j + 1) % n {
            edges.push(Edge::new(i, j, rng.weight()));
        }
    }
    edges
}

/// Erdos-Renyi style: about two outgoing links per node, no duplicates.
fn gen_random(n: u32) -> Vec<Edge<u32>> {
    let mut rng = FastRng::new(2024);
    let n = n.max(2) * 2;
    let mut seen = std::collections::HashSet::new();
    let mut edges = Vec::new();

    for _ in 0..n * 2 {
        let a = rng.next(n as u64) as u32;
        let b = rng.next(n as u64) as u32;
        if a != b && seen.insert((a, b)) {
            edges.push(Edge::new(a, b, rng.weight()));
        }
    }
    edges
}

/// Two bidirectional cliques joined by a single one-way bridge.
fn gen_barbell(clique: u32) -> Vec<Edge<u32>> {
    let mut rng = FastRng::new(99);
    let k = clique.max(2);
    let mut edges = Vec::new();

    for offset in [0, k] {
        for i in 0..k {
            for j in (i + 1)..k {
                edges.push(Edge::new(offset + i, offset + j, rng.weight()));
                edges.push(Edge::new(offset + j, offset + i, rng.weight()));
            }
        }
    }
    edges.push(Edge::new(k - 1, k, rng.weight()));
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generators_build_valid_topologies() {
        for generator in [gen_grid, gen_ring, gen_random, gen_barbell] {
            let edges = generator(3);
            assert!(!edges.is_empty());
            assert!(DirectedPathService::new(edges).is_ok());
        }
    }

    #[test]
    fn test_barbell_bridge_is_one_way() {
        let svc = DirectedPathService::new(gen_barbell(3)).unwrap();
        assert!(!svc.directed_paths(&0, &5).unwrap().is_empty());
        assert!(svc.directed_paths(&5, &0).unwrap().is_empty());
    }

    #[test]
    fn test_random_probabilities_stay_in_range() {
        let edges = gen_ring(3);
        let p = random_probabilities(&edges, 0.9, 0.99).unwrap();
        assert_eq!(p.len(), edges.len());
        for e in &edges {
            let value = p.get(&e.source, &e.target).unwrap();
            assert!((0.9..=0.99).contains(&value));
        }

        let fixed = random_probabilities(&edges, 0.5, 0.5).unwrap();
        assert_eq!(fixed.get(&edges[0].source, &edges[0].target), Some(0.5));

        assert!(random_probabilities(&edges, 0.0, 0.5).is_err());
        assert!(random_probabilities(&edges, 0.9, 1.5).is_err());
        assert!(random_probabilities(&edges, 0.99, 0.9).is_err());
    }

    #[test]
    fn test_grid_numbering() {
        let edges = gen_grid(3);
        assert!(edges.iter().all(|e| (1..=9).contains(&e.source) && (1..=9).contains(&e.target)));
        assert!(edges.iter().any(|e| e.source == 1 && e.target == 2));
        assert!(edges.iter().any(|e| e.source == 1 && e.target == 4));
    }
}
