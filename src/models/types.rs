//! Data types produced by model grouping and consumed by the reporters.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::stats::SongAverages;

/// Grouped score for a single model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelScore {
    pub name: String,
    /// Arithmetic mean of the model's song averages.
    pub mos: f64,
    /// Population standard deviation across those song averages.
    pub stddev: f64,
    pub label: String,
    /// 1-based survey positions the score was taken from.
    pub positions: Vec<usize>,
}

/// Per-model scores, in index-map order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ModelAverages(pub(crate) Vec<ModelScore>);

impl ModelAverages {
    pub fn get(&self, model: &str) -> Option<&ModelScore> {
        self.0.iter().find(|s| s.name == model)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelScore> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything one run produced, emitted with `--json`.
#[derive(Debug, Serialize)]
pub struct MosReport {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub respondents: usize,
    pub index_map_version: String,
    pub songs: SongAverages,
    pub models: ModelAverages,
}
