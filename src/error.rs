use thiserror::Error;

/// Errors raised while loading a grid map. All of them are fatal: the planner
/// never starts on a map it could not fully classify.
#[derive(Error, Debug)]
pub enum MapError {
    #[error("failed to read map file '{0}': {1}")]
    ReadFile(String, std::io::Error),

    #[error("map contains no rows")]
    Empty,

    #[error("unrecognized map symbol {symbol:?} at row {row}, column {col}")]
    UnknownSymbol { symbol: char, row: usize, col: usize },

    #[error("row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Errors raised while loading or validating a task file.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("failed to read task file '{0}': {1}")]
    ReadFile(String, std::io::Error),

    #[error("failed to parse YAML task file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unexpected end of task input while reading {0}")]
    MissingToken(String),

    #[error("invalid number {token:?} while reading {context}")]
    InvalidNumber { token: String, context: String },

    #[error("agent {0} has no waypoints")]
    NoWaypoints(usize),

    #[error("agent {agent} waypoint {position:?} is outside the map")]
    OutOfBounds {
        agent: usize,
        position: (usize, usize),
    },

    #[error("agent {agent} waypoint {position:?} is not accessible")]
    Inaccessible {
        agent: usize,
        position: (usize, usize),
    },

    #[error("agent ids must be 0..{expected}, found {found}")]
    InvalidAgentId { expected: usize, found: usize },
}
