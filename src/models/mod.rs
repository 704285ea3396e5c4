//! Model grouping of per-song scores.
//!
//! A [`ModelIndexMap`] assigns songs to the systems under evaluation;
//! [`mos_of_models`] folds the 20 song averages into one score per model
//! and attaches a spread and an opinion-scale label.

pub mod aggregate;
pub mod grade;
pub mod index_map;
pub mod types;
pub mod utility;

pub use aggregate::mos_of_models;
pub use index_map::{GroupDiff, ModelGroup, ModelIndexMap, SongSlot};
pub use types::{ModelAverages, ModelScore};
