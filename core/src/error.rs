use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::EngineError;

/// Broad failure classes, for callers that only need to branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedTopology,
    InvalidQuery,
    ProbabilityDomain,
    EngineFailure,
    Configuration,
}

#[derive(Error, Debug)]
pub enum PathError {
    /// A link whose source and target are the same node.
    #[error("malformed topology: self-loop at node {node}")]
    SelfLoop { node: String },

    /// The same ordered pair was given twice, so its bucket would hold a
    /// duplicate orientation.
    #[error("malformed topology: link {from} -> {to} appears more than once")]
    DuplicateLink { from: String, to: String },

    #[error("malformed topology: link {from} -> {to} has non-finite weight {weight}")]
    NonFiniteWeight {
        from: String,
        to: String,
        weight: f64,
    },

    #[error("invalid query: start and target are both {0}")]
    SameTerminals(String),

    #[error("invalid query: node {0} is not in the topology")]
    UnknownNode(String),

    #[error("invalid query: subgraph length must be at least 1")]
    ZeroLength,

    /// Probabilities must lie in (0, 1] for the log10 transform.
    #[error("probability {value} for link {link} is outside (0, 1]")]
    ProbabilityDomain { link: String, value: f64 },

    #[error("no probability given for link {0}")]
    MissingProbability(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PathError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PathError::SelfLoop { .. }
            | PathError::DuplicateLink { .. }
            | PathError::NonFiniteWeight { .. } => ErrorKind::MalformedTopology,
            PathError::SameTerminals(_) | PathError::UnknownNode(_) | PathError::ZeroLength => {
                ErrorKind::InvalidQuery
            }
            PathError::ProbabilityDomain { .. } | PathError::MissingProbability(_) => {
                ErrorKind::ProbabilityDomain
            }
            PathError::Engine(_) => ErrorKind::EngineFailure,
            PathError::Config(_) => ErrorKind::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, PathError>;
