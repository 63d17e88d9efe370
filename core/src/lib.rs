//! dipath-core: directed simple-path enumeration on top of an undirected
//! subgraph enumerator.
//!
//! Each bidirectional link pair is split: one direction stays a direct link,
//! the other is routed through a virtual node. The engine enumerates
//! undirected paths over the result, and the paths that take any link
//! against its direction are excluded in one batch (see [`exclusion`]).
//!
//! Pure Rust, no I/O. The `dipath-bench` binary drives it on generated topologies.

pub mod config;
pub mod engine;
pub mod error;
pub mod exclusion;
pub mod grouping;
pub mod scoring;
pub mod service;
pub mod topology;
pub mod types;

pub use config::{ConfigError, ServiceConfig};
pub use engine::{
    DegreeConstraint, EdgeIdx, EdgeSet, EngineError, EnumerationEngine, ExplicitEngine,
    ExplicitFamily, SubgraphFamily, SubgraphQuery,
};
pub use error::{ErrorKind, PathError, Result};
pub use exclusion::ForbiddenSet;
pub use grouping::{group_edges, EdgeBucket, OrientationPolicy};
pub use scoring::{path_probability, LinkProbabilities};
pub use service::DirectedPathService;
pub use topology::Topology;
pub use types::{Edge, Label, Link, NodeId};
