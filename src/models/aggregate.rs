use tracing::debug;

use crate::models::grade::grade;
use crate::models::index_map::ModelIndexMap;
use crate::models::types::{ModelAverages, ModelScore};
use crate::models::utility::{mean, stddev};
use crate::stats::SongAverages;

/// Folds the 20 song averages into one score per model.
///
/// Each model's MOS is the arithmetic mean of the averages at its configured
/// positions. The map is validated on construction, so every index is in
/// range and this cannot fail.
pub fn mos_of_models(averages: &SongAverages, map: &ModelIndexMap) -> ModelAverages {
    let scores = map
        .models()
        .iter()
        .map(|group| {
            let series: Vec<f64> = group.songs.iter().map(|s| averages[s.index()]).collect();
            let avg = mean(&series);
            let sd = stddev(&series, avg);

            debug!(model = %group.name, mos = avg, stddev = sd, "Model aggregated");

            ModelScore {
                name: group.name.clone(),
                mos: avg,
                stddev: sd,
                label: grade(avg),
                positions: group.positions(),
            }
        })
        .collect();

    ModelAverages(scores)
}
