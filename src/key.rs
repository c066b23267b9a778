//! Canonical artist identity.
//!
//! Every component groups by `ArtistKey`, and keys are resolved exactly once
//! during ingestion. Raw artist names from the chart tables carry inconsistent
//! padding, so names are always trimmed before they become a key.

use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;

use crate::models::Artist;

/// Identity used to group scores, heatmap rows and selections.
///
/// An artist with a database id is keyed by that id. Query variants that do
/// not select the id fall back to the trimmed name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum ArtistKey {
    Id(i64),
    Name(String),
}

impl ArtistKey {
    /// The one key function. Do not build keys any other way.
    pub fn resolve(id: Option<i64>, name: &str) -> Self {
        match id {
            Some(id) => ArtistKey::Id(id),
            None => ArtistKey::Name(clean_name(name).to_string()),
        }
    }

    pub fn of(artist: &Artist) -> Self {
        Self::resolve(artist.id, &artist.name)
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            ArtistKey::Id(id) => Some(*id),
            ArtistKey::Name(_) => None,
        }
    }
}

impl fmt::Display for ArtistKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtistKey::Id(id) => write!(f, "#{}", id),
            ArtistKey::Name(name) => f.write_str(name),
        }
    }
}

/// Filler name the fetch layer writes when a song has no credit.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Trim surrounding whitespace from a raw artist name.
pub fn clean_name(name: &str) -> &str {
    name.trim()
}

/// One credited artist on a record, after key resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credit {
    pub key: ArtistKey,
    pub name: String,
}

/// Resolve keys for a song's artist list and drop repeated credits.
///
/// A featured artist listed twice on the same song is credited once; the
/// first occurrence wins and credit order is otherwise preserved.
pub fn dedup_credits(artists: &[Artist]) -> Vec<Credit> {
    let mut seen: FxHashSet<ArtistKey> = FxHashSet::default();
    let mut credits = Vec::with_capacity(artists.len());

    for artist in artists {
        let key = ArtistKey::of(artist);
        if seen.insert(key.clone()) {
            credits.push(Credit {
                key,
                name: clean_name(&artist.name).to_string(),
            });
        }
    }

    credits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artist(id: Option<i64>, name: &str) -> Artist {
        Artist {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_resolve_prefers_id() {
        assert_eq!(ArtistKey::resolve(Some(3), "  Karol G "), ArtistKey::Id(3));
        assert_eq!(
            ArtistKey::resolve(None, "  Karol G "),
            ArtistKey::Name("Karol G".to_string())
        );
    }

    #[test]
    fn test_padded_names_share_a_key() {
        assert_eq!(
            ArtistKey::of(&artist(None, "Bad Bunny ")),
            ArtistKey::of(&artist(None, "\tBad Bunny"))
        );
    }

    #[test]
    fn test_dedup_credits_keeps_first() {
        let credits = dedup_credits(&[
            artist(None, "Feid"),
            artist(None, " ATL Jacob"),
            artist(None, "Feid  "),
        ]);
        assert_eq!(credits.len(), 2);
        assert_eq!(credits[0].name, "Feid");
        assert_eq!(credits[1].name, "ATL Jacob");
    }

    #[test]
    fn test_dedup_credits_by_id() {
        // Same id, different spelling: still one artist
        let credits = dedup_credits(&[artist(Some(9), "Rosé"), artist(Some(9), "ROSÉ")]);
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].key, ArtistKey::Id(9));
    }

    #[test]
    fn test_display() {
        assert_eq!(ArtistKey::Id(12).to_string(), "#12");
        assert_eq!(ArtistKey::Name("SZA".into()).to_string(), "SZA");
    }
}
