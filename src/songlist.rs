//! Song list slicing and the user's picked songs for the detail chart.

use chrono::NaiveDate;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::models::{format_date, RankingRecord, Song};
use crate::selection::Selection;

// ============================================================================
// Visible Songs
// ============================================================================

/// Records shown in the song list for `date`.
///
/// Keeps the first row per `spotify_id` and, when artists are selected, only
/// songs crediting at least one of them.
pub fn visible_songs<'a>(
    records: &'a [RankingRecord],
    date: NaiveDate,
    selection: &Selection,
) -> Vec<&'a RankingRecord> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    records
        .iter()
        .filter(|r| r.snapshot_date == date)
        .filter(|r| seen.insert(r.spotify_id.as_str()))
        .filter(|r| selection.matches(r))
        .collect()
}

/// One card in the song list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongCard {
    pub spotify_id: String,
    pub name: String,
    pub artists: String,
    pub daily_rank: u8,
    pub snapshot_date: String,
    pub picked: bool,
}

pub fn song_cards(visible: &[&RankingRecord], picked: &SelectedSongs) -> Vec<SongCard> {
    visible
        .iter()
        .map(|r| SongCard {
            spotify_id: r.spotify_id.clone(),
            name: r.song.name.clone(),
            artists: r.song.artist_line(),
            daily_rank: r.daily_rank.get(),
            snapshot_date: format_date(r.snapshot_date),
            picked: picked.contains(&r.spotify_id),
        })
        .collect()
}

// ============================================================================
// Picked Songs
// ============================================================================

/// Songs picked with "+" for the detail chart, in pick order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SelectedSongs {
    songs: Vec<Song>,
}

impl SelectedSongs {
    /// Add the song if absent, remove it if present (by `spotify_id`).
    /// Returns whether it is picked afterwards.
    pub fn toggle(&mut self, song: &Song) -> bool {
        if let Some(pos) = self.position(&song.spotify_id) {
            self.songs.remove(pos);
            false
        } else {
            self.songs.push(song.clone());
            true
        }
    }

    pub fn contains(&self, spotify_id: &str) -> bool {
        self.position(spotify_id).is_some()
    }

    pub fn clear(&mut self) {
        self.songs.clear();
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn as_slice(&self) -> &[Song] {
        &self.songs
    }

    /// Radar while the pick is small, parallel coordinates beyond `radar_limit`.
    pub fn detail_chart(&self, radar_limit: usize) -> DetailChart {
        match self.songs.len() {
            0 => DetailChart::Empty,
            n if n <= radar_limit => DetailChart::Radar,
            _ => DetailChart::Parallel,
        }
    }

    fn position(&self, spotify_id: &str) -> Option<usize> {
        self.songs.iter().position(|s| s.spotify_id == spotify_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailChart {
    Empty,
    Radar,
    Parallel,
}

// ============================================================================
// Detail Chart Data
// ============================================================================

pub const FEATURE_LABELS: [&str; 6] = [
    "Energy",
    "Danceability",
    "Valence",
    "Acousticness",
    "Instrumentalness",
    "Liveness",
];

/// One polygon (radar) or polyline (parallel plot), axes as `FEATURE_LABELS`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarDataset {
    pub label: String,
    pub spotify_id: String,
    pub data: [Option<f64>; 6],
}

pub fn radar_datasets(songs: &[Song]) -> Vec<RadarDataset> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    songs
        .iter()
        .filter(|s| seen.insert(s.spotify_id.as_str()))
        .map(|s| {
            let f = &s.features;
            RadarDataset {
                label: s.name.clone(),
                spotify_id: s.spotify_id.clone(),
                data: [
                    f.energy,
                    f.danceability,
                    f.valence,
                    f.acousticness,
                    f.instrumentalness,
                    f.liveness,
                ],
            }
        })
        .collect()
}

// ============================================================================
// Date Slider
// ============================================================================

/// Which date the song list shows.
///
/// Sits on the earliest date until the user touches the slider, so a refetch
/// that changes the date list does not move the slice under them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateCursor {
    dates: Vec<NaiveDate>,
    chosen: Option<NaiveDate>,
    has_user_interacted: bool,
}

impl DateCursor {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            ..Self::default()
        }
    }

    /// Replace the date list after a fetch. Interaction state is kept.
    pub fn set_dates(&mut self, dates: Vec<NaiveDate>) {
        self.dates = dates;
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn has_user_interacted(&self) -> bool {
        self.has_user_interacted
    }

    /// Slider moved to `index`. Out-of-range indices are ignored.
    pub fn select_index(&mut self, index: usize) -> Option<NaiveDate> {
        let date = *self.dates.get(index)?;
        self.chosen = Some(date);
        self.has_user_interacted = true;
        Some(date)
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.chosen = Some(date);
        self.has_user_interacted = true;
    }

    pub fn effective_date(&self) -> Option<NaiveDate> {
        if self.has_user_interacted {
            self.chosen
        } else {
            self.dates.first().copied()
        }
    }

    /// Slider position of the effective date, if it is in the current list.
    pub fn slider_position(&self) -> Option<usize> {
        let date = self.effective_date()?;
        self.dates.binary_search(&date).ok()
    }
}
