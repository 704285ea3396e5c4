//! CLI entry point for the MOS rater.
//!
//! Reads a survey CSV, averages each song's ratings, groups the songs into
//! models through an index map, and reports the result as text, JSON, a CSV
//! history row and optional figures.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use mos_rater::models::types::MosReport;
use mos_rater::models::{ModelIndexMap, mos_of_models};
use mos_rater::{output, parser::read_survey, plot};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser, Debug)]
#[command(name = "mos_rater")]
#[command(about = "Average MOS per song and per model from a survey CSV", long_about = None)]
struct Cli {
    /// Path to the survey CSV file
    #[arg(short = 'f', long = "file_path", visible_alias = "file-path", value_name = "PATH")]
    file_path: PathBuf,

    /// JSON index map to group songs with (falls back to $MOS_INDEX_MAP)
    #[arg(long, value_name = "PATH")]
    index_map: Option<PathBuf>,

    /// Built-in index map used when no JSON map is given
    #[arg(long, default_value = "v1")]
    index_map_version: String,

    /// Second JSON index map to compare model scores against
    #[arg(long, value_name = "PATH")]
    compare_index_map: Option<PathBuf>,

    /// Also print the average of the song at this 1-based position (repeatable)
    #[arg(long, value_name = "POSITION", value_parser = clap::value_parser!(u8).range(1..=20))]
    show_song: Vec<u8>,

    /// Print a JSON report instead of text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// CSV file to append per-model results to
    #[arg(short, long, value_name = "CSV")]
    output: Option<PathBuf>,

    /// Render violin and box plots
    #[arg(long, default_value_t = false)]
    plot: bool,

    /// Directory the figures are written to
    #[arg(long, default_value = "figures")]
    figures_dir: PathBuf,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing();
    let cli = Cli::parse();

    run(&cli)
}

/// Colored stderr logs, plus a JSON rolling log file when `LOG_FILE_PATH` is set.
fn init_tracing() -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", LevelFilter::INFO));

    let (json_layer, guard) = match std::env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let path = Path::new(&log_file_path);
            let log_dir = path.parent().unwrap_or(Path::new("logs"));
            let log_file_name = path.file_name().unwrap_or(OsStr::new("mos_rater.log"));

            let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking_file)
                .with_filter(env_filter("RUST_LOG_JSON", LevelFilter::DEBUG));
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

fn env_filter(var: &str, default: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .with_env_var(var)
        .from_env_lossy()
}

/// Picks the index map: `--index-map`, then `$MOS_INDEX_MAP`, then the
/// built-in `--index-map-version`.
fn select_index_map(cli: &Cli) -> Result<ModelIndexMap> {
    let path = cli
        .index_map
        .clone()
        .or_else(|| std::env::var_os("MOS_INDEX_MAP").map(PathBuf::from));

    let map = match path {
        Some(path) => ModelIndexMap::load(&path)?,
        None => ModelIndexMap::builtin(&cli.index_map_version)?,
    };
    info!(version = map.version(), "Index map selected");
    Ok(map)
}

#[tracing::instrument(skip_all, fields(file = %cli.file_path.display()))]
fn run(cli: &Cli) -> Result<()> {
    let map = select_index_map(cli)?;

    let survey = read_survey(&cli.file_path, cli.plot)?;
    if survey.respondents == 0 {
        warn!("Survey has no data rows; all averages are 0");
    }

    let models = mos_of_models(&survey.averages, &map);
    let report = MosReport {
        generated_at: Utc::now(),
        source: cli.file_path.display().to_string(),
        respondents: survey.respondents,
        index_map_version: map.version().to_string(),
        songs: survey.averages,
        models,
    };

    if cli.json {
        println!("{}", output::render_json(&report)?);
    } else {
        let show_songs: Vec<usize> = cli.show_song.iter().map(|&p| p as usize).collect();
        print!(
            "{}",
            output::render_text(&report.songs, &report.models, &show_songs)?
        );
    }

    if let Some(path) = &cli.compare_index_map {
        let other = ModelIndexMap::load(path)?;
        let other_models = mos_of_models(&report.songs, &other);
        let diff = map.diff(&other);

        if cli.json {
            warn!("Index map comparison is only printed in text mode");
        } else {
            println!();
            print!(
                "{}",
                output::render_comparison(
                    (map.version(), &report.models),
                    (other.version(), &other_models),
                    &diff,
                )?
            );
        }
    }

    if let Some(path) = &cli.output {
        output::append_record(path, &report)?;
        info!(path = %path.display(), "Results appended");
    }

    if let Some(samples) = &survey.samples {
        let dists = plot::model_distributions(samples, &map);
        plot::render_plots(&cli.figures_dir, &dists)?;
    }

    Ok(())
}
