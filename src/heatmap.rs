//! Per-artist best-rank time series for the calendar heatmap.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::key::ArtistKey;
use crate::models::{format_date, DailyRank, RankingRecord};
use crate::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    /// `None` means the artist was outside the top 50 that day.
    pub best_rank: Option<DailyRank>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapSeries {
    pub key: ArtistKey,
    pub artist_name: String,
    pub cells: Vec<HeatmapCell>,
}

/// Every distinct snapshot date in the batch, oldest first.
pub fn distinct_dates(records: &[RankingRecord]) -> Vec<NaiveDate> {
    records
        .iter()
        .map(|r| r.snapshot_date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// One series per artist, one cell per distinct date.
///
/// When an artist charts more than once on a day the better placement wins.
/// Series come out in order of first appearance.
pub fn build_series(records: &[RankingRecord]) -> Vec<HeatmapSeries> {
    let dates = distinct_dates(records);
    let date_index: FxHashMap<NaiveDate, usize> =
        dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

    let mut index: FxHashMap<&ArtistKey, usize> = FxHashMap::default();
    let mut names: Vec<&str> = Vec::new();
    let mut keys: Vec<&ArtistKey> = Vec::new();
    let mut ranks: Vec<Vec<Option<DailyRank>>> = Vec::new();

    for record in records {
        let col = date_index[&record.snapshot_date];
        for credit in &record.credits {
            let row = *index.entry(&credit.key).or_insert_with(|| {
                keys.push(&credit.key);
                names.push(&credit.name);
                ranks.push(vec![None; dates.len()]);
                ranks.len() - 1
            });
            let cell = &mut ranks[row][col];
            *cell = Some(match *cell {
                Some(best) => best.min(record.daily_rank),
                None => record.daily_rank,
            });
        }
    }

    keys.into_iter()
        .zip(names)
        .zip(ranks)
        .map(|((key, name), row)| HeatmapSeries {
            key: key.clone(),
            artist_name: name.to_string(),
            cells: dates
                .iter()
                .zip(row)
                .map(|(date, best_rank)| HeatmapCell {
                    date: *date,
                    best_rank,
                })
                .collect(),
        })
        .collect()
}

/// Presentation order: with `float_selected`, selected artists move to the
/// end of the list (drawn on top) and everyone else keeps their order.
pub fn display_order<'a>(
    series: &'a [HeatmapSeries],
    selection: &Selection,
    float_selected: bool,
) -> Vec<&'a HeatmapSeries> {
    if !float_selected || selection.is_empty() {
        return series.iter().collect();
    }
    let (selected, rest): (Vec<_>, Vec<_>) =
        series.iter().partition(|s| selection.contains(&s.key));
    rest.into_iter().chain(selected).collect()
}

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapPoint {
    pub x: String,
    pub y: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapSeriesData {
    pub name: String,
    pub data: Vec<HeatmapPoint>,
}

impl From<&HeatmapSeries> for HeatmapSeriesData {
    fn from(series: &HeatmapSeries) -> Self {
        Self {
            name: series.artist_name.clone(),
            data: series
                .cells
                .iter()
                .map(|c| HeatmapPoint {
                    x: format_date(c.date),
                    y: c.best_rank.map(DailyRank::get),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Colour Bands
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBand {
    Top10,
    Top20,
    Top30,
    Top40,
    Top50,
    Outside,
}

impl RankBand {
    pub const ALL: [RankBand; 6] = [
        RankBand::Top10,
        RankBand::Top20,
        RankBand::Top30,
        RankBand::Top40,
        RankBand::Top50,
        RankBand::Outside,
    ];

    pub fn of(rank: Option<DailyRank>) -> Self {
        match rank.map(DailyRank::get) {
            Some(1..=10) => RankBand::Top10,
            Some(11..=20) => RankBand::Top20,
            Some(21..=30) => RankBand::Top30,
            Some(31..=40) => RankBand::Top40,
            Some(_) => RankBand::Top50,
            None => RankBand::Outside,
        }
    }

    /// Inclusive rank range covered by the band.
    pub fn range(self) -> Option<(u8, u8)> {
        match self {
            RankBand::Top10 => Some((1, 10)),
            RankBand::Top20 => Some((11, 20)),
            RankBand::Top30 => Some((21, 30)),
            RankBand::Top40 => Some((31, 40)),
            RankBand::Top50 => Some((41, 50)),
            RankBand::Outside => None,
        }
    }

    /// `None` for cells the heatmap leaves unfilled.
    pub fn color(self) -> Option<&'static str> {
        match self {
            RankBand::Top10 => Some("#1DB954"), // Spotify green
            RankBand::Top20 => Some("#6FCC9B"),
            RankBand::Top30 => Some("#FFB300"),
            RankBand::Top40 => Some("#FFA726"),
            RankBand::Top50 => Some("#FF0000"),
            RankBand::Outside => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest_values;
    use serde_json::json;

    fn records(rows: &[(&str, i64, &str)]) -> Vec<RankingRecord> {
        let values = rows
            .iter()
            .enumerate()
            .map(|(i, (artist, rank, date))| {
                json!({
                    "spotify_id": format!("song{}", i),
                    "daily_rank": rank,
                    "snapshot_date": date,
                    "Songs": {"Song_artists": [{"Artists": {"name": artist}}]}
                })
            })
            .collect();
        ingest_values(values).records
    }

    fn ymd(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ranks(series: &HeatmapSeries) -> Vec<Option<u8>> {
        series.cells.iter().map(|c| c.best_rank.map(DailyRank::get)).collect()
    }

    #[test]
    fn test_scenario_series() {
        let recs = records(&[
            ("A", 1, "2024-01-01"),
            ("A", 10, "2024-01-02"),
            ("B", 5, "2024-01-01"),
        ]);
        let series = build_series(&recs);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].artist_name, "A");
        assert_eq!(ranks(&series[0]), vec![Some(1), Some(10)]);
        assert_eq!(series[1].artist_name, "B");
        assert_eq!(ranks(&series[1]), vec![Some(5), None]);
    }

    #[test]
    fn test_best_rank_wins() {
        let recs = records(&[("A", 30, "2024-01-01"), ("A", 5, "2024-01-01")]);
        assert_eq!(ranks(&build_series(&recs)[0]), vec![Some(5)]);
    }

    #[test]
    fn test_missing_day_is_none() {
        let recs = records(&[
            ("A", 5, "2024-01-01"),
            ("B", 2, "2024-01-02"),
            ("A", 12, "2024-01-03"),
        ]);
        let a = &build_series(&recs)[0];
        assert_eq!(ranks(a), vec![Some(5), None, Some(12)]);
    }

    #[test]
    fn test_cells_aligned_to_sorted_dates() {
        // input deliberately out of date order
        let recs = records(&[
            ("A", 3, "2024-01-03"),
            ("B", 4, "2024-01-01"),
            ("A", 9, "2024/01/02"),
        ]);
        let dates = distinct_dates(&recs);
        assert_eq!(
            dates,
            vec![ymd("2024-01-01"), ymd("2024-01-02"), ymd("2024-01-03")]
        );
        for series in build_series(&recs) {
            let cell_dates: Vec<_> = series.cells.iter().map(|c| c.date).collect();
            assert_eq!(cell_dates, dates);
        }
    }

    #[test]
    fn test_build_series_is_idempotent() {
        let recs = records(&[("A", 3, "2024-01-01"), ("B", 4, "2024-01-02")]);
        assert_eq!(build_series(&recs), build_series(&recs));
    }

    #[test]
    fn test_empty_batch() {
        assert!(build_series(&[]).is_empty());
        assert!(distinct_dates(&[]).is_empty());
    }

    #[test]
    fn test_wire_format_uses_null() {
        let recs = records(&[("A", 7, "2024-01-01"), ("B", 1, "2024-01-02")]);
        let data = HeatmapSeriesData::from(&build_series(&recs)[0]);
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(
            value,
            json!({"name": "A", "data": [
                {"x": "2024-01-01", "y": 7},
                {"x": "2024-01-02", "y": null}
            ]})
        );
    }

    #[test]
    fn test_display_order_floats_selected() {
        let recs = records(&[
            ("A", 1, "2024-01-01"),
            ("B", 2, "2024-01-01"),
            ("C", 3, "2024-01-01"),
        ]);
        let series = build_series(&recs);
        let mut selection = Selection::default();
        selection.toggle(ArtistKey::Name("A".into()));

        let names: Vec<_> = display_order(&series, &selection, true)
            .iter()
            .map(|s| s.artist_name.as_str())
            .collect();
        assert_eq!(names, vec!["B", "C", "A"]);

        let unchanged: Vec<_> = display_order(&series, &selection, false)
            .iter()
            .map(|s| s.artist_name.as_str())
            .collect();
        assert_eq!(unchanged, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_rank_bands() {
        assert_eq!(RankBand::of(DailyRank::new(1)), RankBand::Top10);
        assert_eq!(RankBand::of(DailyRank::new(20)), RankBand::Top20);
        assert_eq!(RankBand::of(DailyRank::new(50)), RankBand::Top50);
        assert_eq!(RankBand::of(None), RankBand::Outside);
        assert_eq!(RankBand::Top10.color(), Some("#1DB954"));
        assert_eq!(RankBand::Outside.color(), None);
        for band in RankBand::ALL {
            if let Some((from, to)) = band.range() {
                assert_eq!(RankBand::of(DailyRank::new(from as i64)), band);
                assert_eq!(RankBand::of(DailyRank::new(to as i64)), band);
            }
        }
    }
}
