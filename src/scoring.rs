//! Artist popularity scoring for the word cloud.
//!
//! This module contains:
//! - The rank-to-points law
//! - Cumulative per-artist aggregation
//! - Word cloud entries and font sizing

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::key::ArtistKey;
use crate::models::{DailyRank, RankingRecord, CHART_SIZE};

// ============================================================================
// Points
// ============================================================================

/// Rank 1 earns 50 points, rank 50 earns 1.
pub fn rank_points(rank: DailyRank) -> u32 {
    (CHART_SIZE as u32 + 1) - rank.get() as u32
}

// ============================================================================
// Aggregation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistScore {
    pub key: ArtistKey,
    pub display_name: String,
    pub score: u32,
}

/// Sum `rank_points` per artist over every record crediting them.
///
/// Output is in order of each artist's first appearance in `records`. Use
/// [`rank_by_score`] for popularity order.
pub fn aggregate(records: &[RankingRecord]) -> Vec<ArtistScore> {
    let mut index: FxHashMap<&ArtistKey, usize> = FxHashMap::default();
    let mut scores: Vec<ArtistScore> = Vec::new();

    for record in records {
        let points = rank_points(record.daily_rank);
        // credits are already unique per record
        for credit in &record.credits {
            match index.get(&credit.key) {
                Some(&i) => scores[i].score += points,
                None => {
                    index.insert(&credit.key, scores.len());
                    scores.push(ArtistScore {
                        key: credit.key.clone(),
                        display_name: credit.name.clone(),
                        score: points,
                    });
                }
            }
        }
    }

    scores
}

/// Highest score first. The sort is stable, so ties keep first-appearance
/// order; callers should not rely on any finer tie-break.
pub fn rank_by_score(mut scores: Vec<ArtistScore>) -> Vec<ArtistScore> {
    scores.sort_by(|a, b| b.score.cmp(&a.score));
    scores
}

// ============================================================================
// Word Cloud
// ============================================================================

/// Input row for the word cloud layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCloudEntry {
    pub text: String,
    pub value: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

pub fn word_cloud(scores: &[ArtistScore]) -> Vec<WordCloudEntry> {
    scores
        .iter()
        .map(|s| WordCloudEntry {
            text: s.display_name.clone(),
            value: s.score,
            id: s.key.id(),
        })
        .collect()
}

/// Linear font size scale, `[1, max value]` onto `[min_px, max_px]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontScale {
    pub min_px: f64,
    pub max_px: f64,
    max_value: u32,
}

impl FontScale {
    pub const DEFAULT_MIN_PX: f64 = 10.0;
    pub const DEFAULT_MAX_PX: f64 = 60.0;

    pub fn for_entries(entries: &[WordCloudEntry]) -> Self {
        let max_value = entries.iter().map(|e| e.value).max().unwrap_or(1).max(1);
        Self {
            min_px: Self::DEFAULT_MIN_PX,
            max_px: Self::DEFAULT_MAX_PX,
            max_value,
        }
    }

    pub fn size(&self, value: u32) -> f64 {
        // Collapsed domain maps everything to the middle of the range
        if self.max_value <= 1 {
            return (self.min_px + self.max_px) / 2.0;
        }
        let t = (value.max(1) - 1) as f64 / (self.max_value - 1) as f64;
        self.min_px + t.min(1.0) * (self.max_px - self.min_px)
    }
}
