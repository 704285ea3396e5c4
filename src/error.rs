use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Survey file has no header row")]
    MissingHeader,

    #[error("Line {line}: expected at least {expected} columns, found {found}")]
    ShortRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}, column {column}: invalid score {value:?}: {source}")]
    InvalidScore {
        line: u64,
        column: usize,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Model {model}: song position {position} is outside 1..={max}")]
    IndexOutOfRange {
        model: String,
        position: usize,
        max: usize,
    },

    #[error("Song position {position} is assigned to both {first} and {second}")]
    DuplicateIndex {
        position: usize,
        first: String,
        second: String,
    },

    #[error("Model {0} is defined more than once")]
    DuplicateModel(String),

    #[error("Model {model}: expected {expected} songs, found {found}")]
    GroupSize {
        model: String,
        expected: usize,
        found: usize,
    },

    #[error("Index map does not cover song positions {missing:?}")]
    IncompleteCoverage { missing: Vec<usize> },

    #[error("Unknown index map version: {0}")]
    UnknownVersion(String),

    #[error("Failed to read index map {}: {source}", path.display())]
    IndexMapFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse index map: {0}")]
    IndexMapJson(#[from] serde_json::Error),
}
