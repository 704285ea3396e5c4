//! CSV reader for survey exports.
//!
//! Expected layout: a header row, then one row per respondent of the form
//! `timestamp, user, song1, ..., song20`. Anything past the 22nd column is
//! ignored.

use csv::{Position, ReaderBuilder, StringRecord, Trim};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::stats::{
    IDENTITY_COLUMNS, RatingAccumulator, RatingRow, SONG_COUNT, SongAverages, Survey,
};

/// Minimum number of columns a data row must carry.
pub const MIN_COLUMNS: usize = IDENTITY_COLUMNS + SONG_COUNT;

/// Converts one CSV record into a [`RatingRow`].
///
/// # Errors
///
/// [`Error::ShortRow`] if the record has fewer than [`MIN_COLUMNS`] fields,
/// [`Error::InvalidScore`] if any rating is not a number.
pub fn parse_row(record: &StringRecord, line: u64) -> Result<RatingRow> {
    if record.len() < MIN_COLUMNS {
        return Err(Error::ShortRow {
            line,
            expected: MIN_COLUMNS,
            found: record.len(),
        });
    }

    let mut scores = [0.0; SONG_COUNT];
    for (i, score) in scores.iter_mut().enumerate() {
        let column = IDENTITY_COLUMNS + i;
        let raw = &record[column];
        *score = raw.parse::<f64>().map_err(|source| Error::InvalidScore {
            line,
            column: column + 1,
            value: raw.to_string(),
            source,
        })?;
    }

    Ok(RatingRow {
        timestamp: record[0].to_string(),
        user: record[1].to_string(),
        scores,
    })
}

/// Fails if the unread input at `pos` opens with an empty line.
///
/// The csv reader drops blank lines without reporting them, but a blank line
/// is a row with no columns and must not be skipped. A record ended by `\r`
/// leaves the `\n` of a CRLF pair unread, so that byte is not a blank line.
fn reject_blank_line(data: &[u8], pos: &Position) -> Result<()> {
    let offset = pos.byte() as usize;
    let mut line = pos.line();
    let mut rest = data.get(offset..).unwrap_or_default();

    if offset > 0 && data[offset - 1] == b'\r' {
        if let Some(tail) = rest.strip_prefix(b"\n") {
            rest = tail;
            line += 1;
        }
    }

    if matches!(rest.first(), Some(b'\n' | b'\r')) {
        return Err(Error::ShortRow {
            line,
            expected: MIN_COLUMNS,
            found: 0,
        });
    }
    Ok(())
}

/// Reads a whole survey file in one pass.
///
/// When `retain_samples` is set the raw ratings are kept per song as well,
/// which the plotting code needs.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display(), retain_samples))]
pub fn read_survey(path: impl AsRef<Path>, retain_samples: bool) -> Result<Survey> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data.as_slice());

    if rdr.headers()?.is_empty() {
        return Err(Error::MissingHeader);
    }

    let mut acc = if retain_samples {
        RatingAccumulator::with_samples()
    } else {
        RatingAccumulator::new()
    };

    let mut record = StringRecord::new();
    loop {
        reject_blank_line(&data, rdr.position())?;
        if !rdr.read_record(&mut record)? {
            break;
        }
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row = parse_row(&record, line)?;
        debug!(line, user = %row.user, "Rating row accepted");
        acc.push(&row);
    }

    let survey = acc.finish();
    info!(respondents = survey.respondents, "Survey loaded");
    Ok(survey)
}

/// Average rating of each of the 20 songs in the survey at `path`.
pub fn calculate_average_mos(path: impl AsRef<Path>) -> Result<SongAverages> {
    Ok(read_survey(path, false)?.averages)
}
