//! Output formatting and persistence for MOS results.
//!
//! Supports the plain-text report, JSON serialization, and CSV append.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

use crate::models::types::MosReport;
use crate::models::{GroupDiff, ModelAverages};
use crate::stats::SongAverages;

/// One line of the CSV history written by [`append_record`].
#[derive(Debug, Serialize)]
struct HistoryRecord<'a> {
    timestamp: DateTime<Utc>,
    source: &'a str,
    index_map_version: &'a str,
    model: &'a str,
    mos: f64,
    stddev: f64,
    label: &'a str,
}

/// Renders the human-readable report.
///
/// `show_songs` holds 1-based positions whose average is printed on its own
/// line after the model block.
pub fn render_text(
    averages: &SongAverages,
    models: &ModelAverages,
    show_songs: &[usize],
) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "Average MOS for each song: {:?}", averages.as_slice())?;
    writeln!(out)?;
    writeln!(out, "Average MOS by model:")?;
    for score in models.iter() {
        writeln!(out, "  {}: {:.4}", score.name, score.mos)?;
    }

    for &position in show_songs {
        let avg = averages
            .position(position)
            .ok_or_else(|| anyhow!("no song at position {position}"))?;
        writeln!(out, "Song {position}: {avg:.4}")?;
    }

    Ok(out)
}

/// Renders model scores under two index maps side by side, followed by the
/// songs that moved between them.
pub fn render_comparison(
    ours: (&str, &ModelAverages),
    theirs: (&str, &ModelAverages),
    diff: &[GroupDiff],
) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "Index map comparison: {} vs {}", ours.0, theirs.0)?;
    for score in ours.1.iter() {
        match theirs.1.get(&score.name) {
            Some(other) => writeln!(
                out,
                "  {}: {:.4} vs {:.4} (delta {:+.4})",
                score.name,
                score.mos,
                other.mos,
                other.mos - score.mos
            )?,
            None => writeln!(out, "  {}: {:.4} vs -", score.name, score.mos)?,
        }
    }
    for score in theirs.1.iter().filter(|s| ours.1.get(&s.name).is_none()) {
        writeln!(out, "  {}: - vs {:.4}", score.name, score.mos)?;
    }

    if diff.is_empty() {
        writeln!(out, "Song assignments are identical.")?;
    } else {
        writeln!(out, "Song assignments that differ:")?;
        for d in diff {
            writeln!(
                out,
                "  {}: {} vs {}",
                d.model,
                format_positions(d.ours.as_deref()),
                format_positions(d.theirs.as_deref())
            )?;
        }
    }

    Ok(out)
}

fn format_positions(positions: Option<&[usize]>) -> String {
    match positions {
        Some(p) => format!("{p:?}"),
        None => "-".to_string(),
    }
}

/// Serializes a full run as pretty-printed JSON.
pub fn render_json(report: &MosReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Appends one CSV row per model to the history file at `path`.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &Path, report: &MosReport) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV history");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    for score in report.models.iter() {
        writer.serialize(HistoryRecord {
            timestamp: report.generated_at,
            source: &report.source,
            index_map_version: &report.index_map_version,
            model: &score.name,
            mos: score.mos,
            stddev: score.stddev,
            label: &score.label,
        })?;
    }
    writer.flush()?;

    Ok(())
}
