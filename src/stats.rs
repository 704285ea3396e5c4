//! Per-song running sums and the averages they produce.

use serde::Serialize;
use std::ops::Index;

/// Number of rated songs in every survey row.
pub const SONG_COUNT: usize = 20;

/// Leading identity columns (timestamp, user) that precede the ratings.
pub const IDENTITY_COLUMNS: usize = 2;

/// One respondent's record. Read once, folded into the accumulator, dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRow {
    pub timestamp: String,
    pub user: String,
    pub scores: [f64; SONG_COUNT],
}

/// Average rating per song position, indexed 0..SONG_COUNT.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SongAverages([f64; SONG_COUNT]);

impl SongAverages {
    pub fn new(values: [f64; SONG_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Looks up a song by its 1-based survey position (`Song1`..`Song20`).
    pub fn position(&self, position: usize) -> Option<f64> {
        position
            .checked_sub(1)
            .and_then(|index| self.0.get(index))
            .copied()
    }
}

impl Index<usize> for SongAverages {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

/// Result of one pass over a survey file.
#[derive(Debug, Clone)]
pub struct Survey {
    pub averages: SongAverages,
    pub respondents: usize,
    /// Raw ratings per song position, kept only when plotting needs them.
    pub samples: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Default)]
pub struct RatingAccumulator {
    totals: [f64; SONG_COUNT],
    counts: [usize; SONG_COUNT],
    rows: usize,
    samples: Option<Vec<Vec<f64>>>,
}

impl RatingAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Like [`RatingAccumulator::new`], but also retains every raw rating.
    pub fn with_samples() -> Self {
        Self {
            samples: Some(vec![Vec::new(); SONG_COUNT]),
            ..Self::default()
        }
    }

    pub fn push(&mut self, row: &RatingRow) {
        self.rows += 1;

        for (i, &score) in row.scores.iter().enumerate() {
            self.totals[i] += score;
            self.counts[i] += 1;
        }

        if let Some(samples) = self.samples.as_mut() {
            for (song, &score) in samples.iter_mut().zip(row.scores.iter()) {
                song.push(score);
            }
        }
    }

    pub fn respondents(&self) -> usize {
        self.rows
    }

    /// Sum / count per column, or 0.0 for a column nothing contributed to.
    pub fn averages(&self) -> SongAverages {
        let mut out = [0.0; SONG_COUNT];
        for (i, avg) in out.iter_mut().enumerate() {
            if self.counts[i] > 0 {
                *avg = self.totals[i] / self.counts[i] as f64;
            }
        }
        SongAverages(out)
    }

    pub fn finish(self) -> Survey {
        Survey {
            averages: self.averages(),
            respondents: self.rows,
            samples: self.samples,
        }
    }
}
