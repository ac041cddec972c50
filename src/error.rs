//! Generator errors

use thiserror::Error;

/// Generator result type
pub type Result<T> = std::result::Result<T, Error>;

/// Placement query that came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementQuery {
    FreeWithClearance,
    InteriorFree,
}

impl std::fmt::Display for PlacementQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlacementQuery::FreeWithClearance => "free cell with clearance",
            PlacementQuery::InteriorFree => "interior free cell",
        };
        f.write_str(name)
    }
}

/// Generator errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no placement available for {query} during {phase}")]
    PlacementExhausted {
        phase: &'static str,
        query: PlacementQuery,
    },

    #[error("malformed scenario line: {0}")]
    Parse(String),

    #[error("missing scenario for seed {0}")]
    MissingSeed(u64),

    #[error("worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("params json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_placement_exhausted(&self) -> bool {
        matches!(self, Error::PlacementExhausted { .. })
    }
}
