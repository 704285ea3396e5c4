//! Versioned song-position → model configuration.
//!
//! A [`ModelIndexMap`] assigns every one of the 20 survey positions to
//! exactly one model, four songs per model. Maps are validated when built,
//! so grouping over one never indexes out of range.
//!
//! Custom maps are plain JSON:
//! ```json
//! {
//!   "version": "v2",
//!   "models": [
//!     { "name": "Expert", "songs": [{ "position": 2, "stimulus": "Expert/2" }, ...] },
//!     ...
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::stats::SONG_COUNT;

/// Songs each model contributes to the survey.
pub const SONGS_PER_MODEL: usize = 4;

/// Names accepted by [`ModelIndexMap::builtin`].
pub const BUILTIN_VERSIONS: &[&str] = &["v1"];

/// (model, [(1-based survey position, stimulus label)])
type Table = &'static [(&'static str, [(usize, &'static str); SONGS_PER_MODEL])];

static V1: Table = &[
    (
        "Expert",
        [(2, "Expert/2"), (7, "Expert/4"), (13, "Expert/1"), (19, "Expert/3")],
    ),
    ("CP", [(3, "CP/2"), (6, "CP/4"), (11, "CP/3"), (16, "CP/1")]),
    (
        "LLaMA",
        [(5, "LLaMA/1"), (10, "LLaMA/3"), (15, "LLaMA/2"), (18, "LLaMA/4")],
    ),
    ("RL", [(1, "RL/4"), (8, "RL/1"), (12, "RL/5"), (17, "RL/2")]),
    (
        "RL+Novelty",
        [
            (4, "RL+Novelty/3"),
            (9, "RL+Novelty/1"),
            (14, "RL+Novelty/4"),
            (20, "RL+Novelty/2"),
        ],
    ),
];

/// One rated song belonging to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongSlot {
    /// 1-based survey column label (`Song1`..`Song20`).
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stimulus: Option<String>,
}

impl SongSlot {
    /// 0-based index into [`crate::stats::SongAverages`].
    pub fn index(&self) -> usize {
        self.position - 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelGroup {
    pub name: String,
    pub songs: Vec<SongSlot>,
}

impl ModelGroup {
    /// Sorted 1-based positions of this group's songs.
    pub fn positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self.songs.iter().map(|s| s.position).collect();
        positions.sort_unstable();
        positions
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelIndexMap {
    version: String,
    models: Vec<ModelGroup>,
}

#[derive(Deserialize)]
struct RawIndexMap {
    version: String,
    models: Vec<ModelGroup>,
}

/// A model whose song positions differ between two maps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDiff {
    pub model: String,
    /// `None` when the model is absent from that map.
    pub ours: Option<Vec<usize>>,
    pub theirs: Option<Vec<usize>>,
}

impl ModelIndexMap {
    /// Builds and validates a map.
    ///
    /// # Errors
    ///
    /// Fails if two groups share a name, a group does not hold exactly
    /// [`SONGS_PER_MODEL`] songs, a position lies outside `1..=20`, a position
    /// is shared by two models, or some position is not assigned at all.
    pub fn new(version: impl Into<String>, models: Vec<ModelGroup>) -> Result<Self> {
        let mut owner: HashMap<usize, &str> = HashMap::new();
        let mut names: HashSet<&str> = HashSet::new();

        for group in &models {
            if !names.insert(&group.name) {
                return Err(Error::DuplicateModel(group.name.clone()));
            }
            if group.songs.len() != SONGS_PER_MODEL {
                return Err(Error::GroupSize {
                    model: group.name.clone(),
                    expected: SONGS_PER_MODEL,
                    found: group.songs.len(),
                });
            }

            for slot in &group.songs {
                if slot.position == 0 || slot.position > SONG_COUNT {
                    return Err(Error::IndexOutOfRange {
                        model: group.name.clone(),
                        position: slot.position,
                        max: SONG_COUNT,
                    });
                }
                if let Some(first) = owner.insert(slot.position, &group.name) {
                    return Err(Error::DuplicateIndex {
                        position: slot.position,
                        first: first.to_string(),
                        second: group.name.clone(),
                    });
                }
            }
        }

        let missing: Vec<usize> = (1..=SONG_COUNT)
            .filter(|p| !owner.contains_key(p))
            .collect();
        if !missing.is_empty() {
            return Err(Error::IncompleteCoverage { missing });
        }

        Ok(Self {
            version: version.into(),
            models,
        })
    }

    /// Returns one of the maps shipped with the tool, see [`BUILTIN_VERSIONS`].
    pub fn builtin(version: &str) -> Result<Self> {
        let table = match version {
            "v1" => V1,
            other => return Err(Error::UnknownVersion(other.to_string())),
        };

        let models = table
            .iter()
            .map(|(name, songs)| ModelGroup {
                name: name.to_string(),
                songs: songs
                    .iter()
                    .map(|&(position, stimulus)| SongSlot {
                        position,
                        stimulus: Some(stimulus.to_string()),
                    })
                    .collect(),
            })
            .collect();

        Self::new(version, models)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawIndexMap = serde_json::from_str(text)?;
        Self::new(raw.version, raw.models)
    }

    /// Loads and validates a JSON map from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::IndexMapFile {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::from_json(&text)?;
        debug!(path = %path.display(), version = %map.version, "Index map loaded");
        Ok(map)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn models(&self) -> &[ModelGroup] {
        &self.models
    }

    /// Models whose song positions disagree between `self` and `other`.
    pub fn diff(&self, other: &ModelIndexMap) -> Vec<GroupDiff> {
        let theirs: HashMap<&str, Vec<usize>> = other
            .models
            .iter()
            .map(|g| (g.name.as_str(), g.positions()))
            .collect();

        let mut out = Vec::new();
        for group in &self.models {
            let ours = group.positions();
            match theirs.get(group.name.as_str()) {
                Some(t) if *t == ours => {}
                t => out.push(GroupDiff {
                    model: group.name.clone(),
                    ours: Some(ours),
                    theirs: t.cloned(),
                }),
            }
        }

        for group in &other.models {
            if !self.models.iter().any(|g| g.name == group.name) {
                out.push(GroupDiff {
                    model: group.name.clone(),
                    ours: None,
                    theirs: Some(group.positions()),
                });
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str, positions: &[usize]) -> ModelGroup {
        ModelGroup {
            name: name.to_string(),
            songs: positions
                .iter()
                .map(|&position| SongSlot {
                    position,
                    stimulus: None,
                })
                .collect(),
        }
    }

    fn striped() -> Vec<ModelGroup> {
        // Model k owns positions k, k+5, k+10, k+15.
        (1..=5)
            .map(|k| group(&format!("M{k}"), &[k, k + 5, k + 10, k + 15]))
            .collect()
    }

    #[test]
    fn test_builtin_v1_is_valid_and_ordered() {
        let map = ModelIndexMap::builtin("v1").unwrap();
        let names: Vec<&str> = map.models().iter().map(|g| g.name.as_str()).collect();

        assert_eq!(map.version(), "v1");
        assert_eq!(names, ["Expert", "CP", "LLaMA", "RL", "RL+Novelty"]);
    }

    #[test]
    fn test_builtin_v1_indices() {
        let map = ModelIndexMap::builtin("v1").unwrap();
        let indices = |name: &str| -> Vec<usize> {
            map.models()
                .iter()
                .find(|g| g.name == name)
                .unwrap()
                .songs
                .iter()
                .map(SongSlot::index)
                .collect()
        };

        assert_eq!(indices("CP"), [2, 5, 10, 15]);
        assert_eq!(indices("Expert"), [1, 6, 12, 18]);
        assert_eq!(indices("LLaMA"), [4, 9, 14, 17]);
        assert_eq!(indices("RL"), [0, 7, 11, 16]);
        assert_eq!(indices("RL+Novelty"), [3, 8, 13, 19]);
    }

    #[test]
    fn test_unknown_builtin_version() {
        let err = ModelIndexMap::builtin("v9").unwrap_err();
        assert!(matches!(err, Error::UnknownVersion(v) if v == "v9"));
    }

    #[test]
    fn test_rejects_out_of_range_position() {
        let mut models = striped();
        models[0].songs[3].position = 21;

        let err = ModelIndexMap::new("bad", models).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { position: 21, .. }));
    }

    #[test]
    fn test_rejects_position_zero() {
        let mut models = striped();
        models[2].songs[0].position = 0;

        let err = ModelIndexMap::new("bad", models).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { position: 0, .. }));
    }

    #[test]
    fn test_rejects_duplicate_position() {
        let mut models = striped();
        models[1].songs[0].position = 1;

        match ModelIndexMap::new("bad", models).unwrap_err() {
            Error::DuplicateIndex {
                position,
                first,
                second,
            } => {
                assert_eq!(position, 1);
                assert_eq!(first, "M1");
                assert_eq!(second, "M2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_duplicate_model_name() {
        let mut models = striped();
        models[3].name = "M1".to_string();

        let err = ModelIndexMap::new("bad", models).unwrap_err();
        assert!(matches!(err, Error::DuplicateModel(name) if name == "M1"));
    }

    #[test]
    fn test_from_json_rejects_duplicate_model_name() {
        let json = r#"{
            "version": "twins",
            "models": [
                {"name": "A", "songs": [{"position": 1}, {"position": 6}, {"position": 11}, {"position": 16}]},
                {"name": "A", "songs": [{"position": 2}, {"position": 7}, {"position": 12}, {"position": 17}]},
                {"name": "C", "songs": [{"position": 3}, {"position": 8}, {"position": 13}, {"position": 18}]},
                {"name": "D", "songs": [{"position": 4}, {"position": 9}, {"position": 14}, {"position": 19}]},
                {"name": "E", "songs": [{"position": 5}, {"position": 10}, {"position": 15}, {"position": 20}]}
            ]
        }"#;

        assert!(matches!(
            ModelIndexMap::from_json(json),
            Err(Error::DuplicateModel(name)) if name == "A"
        ));
    }

    #[test]
    fn test_rejects_wrong_group_size() {
        let mut models = striped();
        models[4].songs.pop();

        let err = ModelIndexMap::new("bad", models).unwrap_err();
        assert!(matches!(err, Error::GroupSize { found: 3, .. }));
    }

    #[test]
    fn test_rejects_incomplete_coverage() {
        let mut models = striped();
        models.pop();

        match ModelIndexMap::new("bad", models).unwrap_err() {
            Error::IncompleteCoverage { missing } => assert_eq!(missing, [5, 10, 15, 20]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_json_validates() {
        let json = r#"{
            "version": "striped",
            "models": [
                {"name": "A", "songs": [{"position": 1}, {"position": 6}, {"position": 11}, {"position": 16}]},
                {"name": "B", "songs": [{"position": 2}, {"position": 7}, {"position": 12}, {"position": 17}]},
                {"name": "C", "songs": [{"position": 3}, {"position": 8}, {"position": 13}, {"position": 18}]},
                {"name": "D", "songs": [{"position": 4}, {"position": 9}, {"position": 14}, {"position": 19}]},
                {"name": "E", "songs": [{"position": 5}, {"position": 10}, {"position": 15}, {"position": 20}]}
            ]
        }"#;
        let map = ModelIndexMap::from_json(json).unwrap();
        assert_eq!(map.version(), "striped");
        assert_eq!(map.models()[4].positions(), [5, 10, 15, 20]);

        let broken = json.replace(r#"{"position": 20}"#, r#"{"position": 19}"#);
        assert!(matches!(
            ModelIndexMap::from_json(&broken),
            Err(Error::DuplicateIndex { position: 19, .. })
        ));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        let err = ModelIndexMap::from_json("{\"version\": 1}").unwrap_err();
        assert!(matches!(err, Error::IndexMapJson(_)));
    }

    #[test]
    fn test_serialized_map_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v1.json");
        let map = ModelIndexMap::builtin("v1").unwrap();
        std::fs::write(&path, serde_json::to_string_pretty(&map).unwrap()).unwrap();

        assert_eq!(ModelIndexMap::load(&path).unwrap(), map);
    }

    #[test]
    fn test_diff_reports_moved_songs() {
        let ours = ModelIndexMap::new("a", striped()).unwrap();
        let mut swapped = striped();
        swapped[0].songs[0].position = 2;
        swapped[1].songs[0].position = 1;
        let theirs = ModelIndexMap::new("b", swapped).unwrap();

        let diff = ours.diff(&theirs);
        assert_eq!(diff.len(), 2);
        assert_eq!(diff[0].model, "M1");
        assert_eq!(diff[0].ours, Some(vec![1, 6, 11, 16]));
        assert_eq!(diff[0].theirs, Some(vec![2, 6, 11, 16]));
        assert!(ours.diff(&ours).is_empty());
    }

    #[test]
    fn test_diff_reports_renamed_models() {
        let ours = ModelIndexMap::new("a", striped()).unwrap();
        let mut renamed = striped();
        renamed[4].name = "M5b".to_string();
        let theirs = ModelIndexMap::new("b", renamed).unwrap();

        let diff = ours.diff(&theirs);
        assert_eq!(diff.len(), 2);
        assert_eq!(diff[0].model, "M5");
        assert_eq!(diff[0].theirs, None);
        assert_eq!(diff[1].model, "M5b");
        assert_eq!(diff[1].ours, None);
    }
}
