//! The shared "selected artists" set.
//!
//! The word cloud writes to it; the heatmap and the song list read it.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::heatmap::HeatmapSeries;
use crate::key::ArtistKey;
use crate::models::RankingRecord;
use crate::scoring::WordCloudEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Selection {
    keys: BTreeSet<ArtistKey>,
}

impl Selection {
    /// Flip membership of `key`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, key: ArtistKey) -> bool {
        if self.keys.remove(&key) {
            false
        } else {
            self.keys.insert(key);
            true
        }
    }

    pub fn contains(&self, key: &ArtistKey) -> bool {
        self.keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &ArtistKey> {
        self.keys.iter()
    }

    /// Song list filter: everything passes while nothing is selected,
    /// otherwise at least one credited artist must be selected.
    pub fn matches(&self, record: &RankingRecord) -> bool {
        self.is_empty() || record.credits.iter().any(|c| self.keys.contains(&c.key))
    }

    /// Whether a word cloud entry should be drawn as selected.
    pub fn marks_word(&self, entry: &WordCloudEntry) -> bool {
        let key = ArtistKey::resolve(entry.id, &entry.text);
        self.keys.contains(&key)
    }

    /// Names of the heatmap series to highlight, in series order.
    pub fn highlighted_names<'a>(&self, series: &'a [HeatmapSeries]) -> Vec<&'a str> {
        series
            .iter()
            .filter(|s| self.keys.contains(&s.key))
            .map(|s| s.artist_name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heatmap::build_series;
    use crate::ingest::ingest_values;
    use serde_json::json;

    fn name(s: &str) -> ArtistKey {
        ArtistKey::Name(s.to_string())
    }

    #[test]
    fn test_toggle_round_trip() {
        let mut selection = Selection::default();
        selection.toggle(name("A"));
        let before = selection.clone();

        assert!(selection.toggle(name("B")));
        assert!(!selection.toggle(name("B")));
        assert_eq!(selection, before);
    }

    #[test]
    fn test_toggle_removes_present_key() {
        let mut selection = Selection::default();
        assert!(selection.toggle(ArtistKey::Id(5)));
        assert!(selection.contains(&ArtistKey::Id(5)));
        assert!(!selection.toggle(ArtistKey::Id(5)));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_matches_and_highlights() {
        let batch = ingest_values(vec![
            json!({"spotify_id": "s1", "daily_rank": 1, "snapshot_date": "2024-01-01",
                   "Songs": {"Song_artists": [{"Artists": {"name": "A "}}, {"Artists": {"name": "B"}}]}}),
            json!({"spotify_id": "s2", "daily_rank": 2, "snapshot_date": "2024-01-01",
                   "Songs": {"Song_artists": [{"Artists": {"name": "C"}}]}}),
        ]);
        let records = &batch.records;
        let mut selection = Selection::default();
        assert!(selection.matches(&records[0]));
        assert!(selection.matches(&records[1]));

        selection.toggle(name("A"));
        assert!(selection.matches(&records[0]));
        assert!(!selection.matches(&records[1]));

        let series = build_series(records);
        assert_eq!(selection.highlighted_names(&series), vec!["A"]);
    }

    #[test]
    fn test_marks_word_uses_same_key() {
        let mut selection = Selection::default();
        selection.toggle(ArtistKey::Id(3));
        selection.toggle(name("Peso Pluma"));

        let by_id = WordCloudEntry { text: "anything".into(), value: 1, id: Some(3) };
        let by_name = WordCloudEntry { text: "Peso Pluma".into(), value: 1, id: None };
        let other = WordCloudEntry { text: "Peso Pluma".into(), value: 1, id: Some(4) };
        assert!(selection.marks_word(&by_id));
        assert!(selection.marks_word(&by_name));
        assert!(!selection.marks_word(&other));
    }
}
