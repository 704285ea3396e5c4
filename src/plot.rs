//! Violin and box plots of the per-model rating distributions.
//!
//! Each model's distribution pools the raw ratings of all its songs. Output is
//! SVG so no system fonts are needed.

use anyhow::Result;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::ModelIndexMap;
use crate::models::utility::{gaussian_kde, quantile_sorted, silverman_bandwidth};

const SIZE: (u32, u32) = (1024, 640);
const HALF_WIDTH: f64 = 0.4;
const KDE_STEPS: usize = 120;

/// Pooled raw ratings for one model, sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDistribution {
    pub name: String,
    pub samples: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct PlotFiles {
    pub violin: PathBuf,
    pub boxplot: PathBuf,
}

/// Five-number summary with Tukey (1.5 IQR) whiskers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
}

impl BoxStats {
    /// `sorted` must be ascending. Returns `None` for an empty slice.
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        if sorted.is_empty() {
            return None;
        }
        let q1 = quantile_sorted(sorted, 0.25);
        let median = quantile_sorted(sorted, 0.5);
        let q3 = quantile_sorted(sorted, 0.75);
        let fence = 1.5 * (q3 - q1);

        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|&v| v >= q1 - fence)
            .unwrap_or(q1);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= q3 + fence)
            .unwrap_or(q3);

        Some(Self {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
        })
    }
}

/// Pools per-song samples into one distribution per model, in map order.
pub fn model_distributions(samples: &[Vec<f64>], map: &ModelIndexMap) -> Vec<ModelDistribution> {
    map.models()
        .iter()
        .map(|group| {
            let mut pooled: Vec<f64> = group
                .songs
                .iter()
                .filter_map(|slot| samples.get(slot.index()))
                .flatten()
                .copied()
                .collect();
            pooled.sort_by(f64::total_cmp);
            ModelDistribution {
                name: group.name.clone(),
                samples: pooled,
            }
        })
        .collect()
}

/// Writes `mos_violin.svg` and `mos_box.svg` under `dir`, creating it if needed.
#[tracing::instrument(skip_all, fields(dir = %dir.display(), models = dists.len()))]
pub fn render_plots(dir: &Path, dists: &[ModelDistribution]) -> Result<PlotFiles> {
    std::fs::create_dir_all(dir)?;

    if dists.iter().all(|d| d.samples.is_empty()) {
        warn!("No ratings to plot; figures will only contain axes");
    }

    let files = PlotFiles {
        violin: dir.join("mos_violin.svg"),
        boxplot: dir.join("mos_box.svg"),
    };
    draw_violin(&files.violin, dists)?;
    draw_box(&files.boxplot, dists)?;

    info!(
        violin = %files.violin.display(),
        boxplot = %files.boxplot.display(),
        "Figures written"
    );
    Ok(files)
}

fn value_range(dists: &[ModelDistribution]) -> (f64, f64) {
    let lo = dists
        .iter()
        .filter_map(|d| d.samples.first())
        .copied()
        .fold(f64::INFINITY, f64::min);
    let hi = dists
        .iter()
        .filter_map(|d| d.samples.last())
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    if lo.is_finite() && hi.is_finite() {
        (lo - 0.5, hi + 0.5)
    } else {
        (0.0, 6.0)
    }
}

fn draw_violin(path: &Path, dists: &[ModelDistribution]) -> Result<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (lo, hi) = value_range(dists);
    let names: Vec<String> = dists.iter().map(|d| d.name.clone()).collect();
    let label = |x: &f64| category_label(&names, *x);

    let mut chart = ChartBuilder::on(&root)
        .caption("MOS by model (violin)", ("sans-serif", 24))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(dists.len() as f64 - 0.5), lo..hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(dists.len().max(1))
        .x_label_formatter(&label)
        .y_desc("Rating")
        .draw()?;

    for (i, dist) in dists.iter().enumerate() {
        if dist.samples.is_empty() {
            continue;
        }
        let color = Palette99::pick(i).to_rgba();
        let x = i as f64;
        let bw = silverman_bandwidth(&dist.samples);

        let grid: Vec<(f64, f64)> = (0..=KDE_STEPS)
            .map(|s| {
                let y = lo + (hi - lo) * s as f64 / KDE_STEPS as f64;
                (y, gaussian_kde(&dist.samples, bw, y))
            })
            .collect();
        let peak = grid.iter().map(|&(_, d)| d).fold(0.0, f64::max);
        if peak <= 0.0 {
            continue;
        }

        let mut outline: Vec<(f64, f64)> = grid
            .iter()
            .map(|&(y, d)| (x + HALF_WIDTH * d / peak, y))
            .collect();
        outline.extend(
            grid.iter()
                .rev()
                .map(|&(y, d)| (x - HALF_WIDTH * d / peak, y)),
        );

        chart.draw_series(std::iter::once(Polygon::new(
            outline.clone(),
            color.mix(0.5).filled(),
        )))?;
        outline.push(outline[0]);
        chart.draw_series(std::iter::once(PathElement::new(outline, color)))?;

        if let Some(stats) = BoxStats::from_sorted(&dist.samples) {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(x, stats.q1), (x, stats.q3)],
                BLACK.stroke_width(3),
            )))?;
            chart.draw_series(std::iter::once(Circle::new(
                (x, stats.median),
                4,
                WHITE.filled(),
            )))?;
        }
    }

    root.present()?;
    Ok(())
}

fn draw_box(path: &Path, dists: &[ModelDistribution]) -> Result<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (lo, hi) = value_range(dists);
    let names: Vec<String> = dists.iter().map(|d| d.name.clone()).collect();
    let label = |x: &f64| category_label(&names, *x);

    let mut chart = ChartBuilder::on(&root)
        .caption("MOS by model (box)", ("sans-serif", 24))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(dists.len() as f64 - 0.5), lo..hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(dists.len().max(1))
        .x_label_formatter(&label)
        .y_desc("Rating")
        .draw()?;

    let half = HALF_WIDTH / 2.0;
    for (i, dist) in dists.iter().enumerate() {
        let Some(stats) = BoxStats::from_sorted(&dist.samples) else {
            continue;
        };
        let color = Palette99::pick(i).to_rgba();
        let x = i as f64;

        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half, stats.q1), (x + half, stats.q3)],
            color.mix(0.4).filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half, stats.q1), (x + half, stats.q3)],
            color.stroke_width(1),
        )))?;
        chart.draw_series(
            [
                vec![(x - half, stats.median), (x + half, stats.median)],
                vec![(x, stats.q3), (x, stats.upper_whisker)],
                vec![(x, stats.q1), (x, stats.lower_whisker)],
                vec![
                    (x - half / 2.0, stats.upper_whisker),
                    (x + half / 2.0, stats.upper_whisker),
                ],
                vec![
                    (x - half / 2.0, stats.lower_whisker),
                    (x + half / 2.0, stats.lower_whisker),
                ],
            ]
            .into_iter()
            .map(|line| PathElement::new(line, BLACK.stroke_width(2))),
        )?;

        chart.draw_series(
            dist.samples
                .iter()
                .filter(|&&v| v < stats.lower_whisker || v > stats.upper_whisker)
                .map(|&v| Circle::new((x, v), 3, color.filled())),
        )?;
    }

    root.present()?;
    Ok(())
}

fn category_label(names: &[String], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    names.get(i as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::SONG_COUNT;

    fn samples() -> Vec<Vec<f64>> {
        (0..SONG_COUNT)
            .map(|i| vec![1.0 + (i % 5) as f64, 3.0, 4.0])
            .collect()
    }

    #[test]
    fn test_box_stats_quartiles() {
        let stats = BoxStats::from_sorted(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.lower_whisker, 1.0);
        assert_eq!(stats.upper_whisker, 5.0);
        assert!(BoxStats::from_sorted(&[]).is_none());
    }

    #[test]
    fn test_box_stats_whiskers_exclude_outliers() {
        let stats = BoxStats::from_sorted(&[3.0, 3.0, 3.0, 4.0, 4.0, 4.0, 20.0]).unwrap();

        assert_eq!(stats.upper_whisker, 4.0);
        assert_eq!(stats.lower_whisker, 3.0);
    }

    #[test]
    fn test_model_distributions_pool_model_songs() {
        let map = ModelIndexMap::builtin("v1").unwrap();
        let dists = model_distributions(&samples(), &map);

        assert_eq!(dists.len(), 5);
        assert_eq!(dists[0].name, "Expert");
        assert_eq!(dists[0].samples.len(), 12);
        assert!(dists[0].samples.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_category_label() {
        let names = vec!["A".to_string(), "B".to_string()];
        assert_eq!(category_label(&names, 1.0), "B");
        assert_eq!(category_label(&names, 0.5), "");
        assert_eq!(category_label(&names, -1.0), "");
        assert_eq!(category_label(&names, 2.0), "");
    }

    #[test]
    fn test_render_plots_creates_directory_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let figures = dir.path().join("figures");
        let map = ModelIndexMap::builtin("v1").unwrap();

        let files = render_plots(&figures, &model_distributions(&samples(), &map)).unwrap();

        for path in [&files.violin, &files.boxplot] {
            let svg = std::fs::read_to_string(path).unwrap();
            assert!(svg.contains("<svg"));
        }
    }
}
