//! Core data models for chart aggregation.
//!
//! This module contains the validated record types the pipeline works on and
//! the raw wire shapes the fetch layer hands us.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::key::Credit;

// ============================================================================
// Chart Positions
// ============================================================================

/// Number of positions in a daily chart.
pub const CHART_SIZE: u8 = 50;

/// A daily chart position, 1 (best) through 50 (worst).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DailyRank(u8);

impl DailyRank {
    /// Returns `None` for anything outside the chart.
    pub fn new(rank: i64) -> Option<Self> {
        if (1..=CHART_SIZE as i64).contains(&rank) {
            Some(DailyRank(rank as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

// ============================================================================
// Snapshot Dates
// ============================================================================

/// Parse a snapshot date as delivered by the fetch layer.
///
/// Dates are compared after parsing, never as strings. Timestamps keep only
/// their calendar date.
pub fn parse_snapshot_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.date_naive());
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts.date());
        }
    }

    None
}

/// ISO 8601 calendar date, the format every chart consumer expects.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ============================================================================
// Validated Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artist {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

/// Spotify audio features. Which ones are present depends on the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioFeatures {
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub valence: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub loudness: Option<f64>,
    pub popularity: Option<f64>, // 0-100
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Song {
    pub spotify_id: String,
    pub name: String,
    pub features: AudioFeatures,
    pub artists: Vec<Artist>, // credited order, as fetched
}

impl Song {
    /// "A, B" for display; "Unknown Artist" when nothing is credited.
    pub fn artist_line(&self) -> String {
        if self.artists.is_empty() {
            return "Unknown Artist".to_string();
        }
        self.artists
            .iter()
            .map(|a| a.name.trim())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One song's position on one day in one country.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRecord {
    pub spotify_id: String, // not unique across dates
    pub daily_rank: DailyRank,
    pub snapshot_date: NaiveDate,
    pub country: Option<String>,
    pub song: Song,
    /// Keys resolved at ingestion, one per distinct artist.
    pub credits: Vec<Credit>,
}

// ============================================================================
// Countries
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Country {
    pub id: i64,
    pub country: String, // ISO code, e.g. "VN"
    pub country_name: Option<String>,
}

// ============================================================================
// Wire Models
// ============================================================================

/// Row as returned by the rankings query. Every field is optional here;
/// ingestion decides what is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRanking {
    pub spotify_id: Option<String>,
    pub daily_rank: Option<i64>,
    pub snapshot_date: Option<String>,
    #[serde(rename = "Countries")]
    pub countries: Option<RawCountry>,
    #[serde(rename = "Songs")]
    pub songs: Option<RawSong>,
    /// Flat variant used by the heatmap query instead of `Songs`.
    pub artist_name: Option<String>,
    /// Set by a source that read a cell it could not decode.
    #[serde(skip)]
    pub malformed: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCountry {
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSong {
    pub spotify_id: Option<String>,
    pub name: Option<String>,
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub valence: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub loudness: Option<f64>,
    pub popularity: Option<f64>,
    #[serde(rename = "Song_artists")]
    pub song_artists: Option<Vec<RawSongArtist>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSongArtist {
    #[serde(rename = "Artists")]
    pub artists: Option<RawArtist>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArtist {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl RawSong {
    pub fn features(&self) -> AudioFeatures {
        AudioFeatures {
            energy: self.energy,
            danceability: self.danceability,
            valence: self.valence,
            acousticness: self.acousticness,
            instrumentalness: self.instrumentalness,
            liveness: self.liveness,
            loudness: self.loudness,
            popularity: self.popularity,
        }
    }
}
