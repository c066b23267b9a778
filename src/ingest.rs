//! Turn fetched rows into validated `RankingRecord`s.
//!
//! Bad rows are skipped and reported; they never abort the batch.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{InvalidRecord, RejectReason};
use crate::key::{clean_name, dedup_credits, UNKNOWN_ARTIST};
use crate::models::{
    parse_snapshot_date, Artist, DailyRank, RankingRecord, RawRanking, RawSong, Song,
};

/// One fetched batch: the records that validated and the rows that did not.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub records: Vec<RankingRecord>,
    pub rejected: Vec<InvalidRecord>,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Ingest rows exactly as the fetch layer returned them.
pub fn ingest_values(rows: Vec<Value>) -> Batch {
    collect(rows.into_iter().enumerate().map(|(index, row)| {
        serde_json::from_value::<RawRanking>(row)
            .map_err(|e| InvalidRecord::new(index, RejectReason::Malformed(e.to_string())))
            .and_then(|raw| validate(index, raw))
    }))
}

/// Ingest rows that were already decoded (e.g. read from SQLite).
pub fn ingest_rows<I>(rows: I) -> Batch
where
    I: IntoIterator<Item = RawRanking>,
{
    collect(
        rows.into_iter()
            .enumerate()
            .map(|(index, raw)| validate(index, raw)),
    )
}

fn collect<I>(results: I) -> Batch
where
    I: Iterator<Item = Result<RankingRecord, InvalidRecord>>,
{
    let mut batch = Batch::default();
    for result in results {
        match result {
            Ok(record) => batch.records.push(record),
            Err(err) => {
                warn!(row = err.index, reason = %err.reason, "skipping invalid ranking row");
                batch.rejected.push(err);
            }
        }
    }
    debug!(
        valid = batch.records.len(),
        rejected = batch.rejected.len(),
        "ingested ranking batch"
    );
    batch
}

/// Validate a single row.
pub fn validate(index: usize, raw: RawRanking) -> Result<RankingRecord, InvalidRecord> {
    let reject = |reason| InvalidRecord::new(index, reason);

    if let Some(detail) = raw.malformed.clone() {
        return Err(reject(RejectReason::Malformed(detail)));
    }

    let rank_value = raw.daily_rank.ok_or_else(|| reject(RejectReason::MissingRank))?;
    let daily_rank =
        DailyRank::new(rank_value).ok_or_else(|| reject(RejectReason::RankOutOfRange(rank_value)))?;

    let date_raw = raw
        .snapshot_date
        .as_deref()
        .ok_or_else(|| reject(RejectReason::MissingDate))?;
    let snapshot_date = parse_snapshot_date(date_raw)
        .ok_or_else(|| reject(RejectReason::InvalidDate(date_raw.to_string())))?;

    let spotify_id = raw
        .spotify_id
        .clone()
        .or_else(|| raw.songs.as_ref().and_then(|s| s.spotify_id.clone()))
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| reject(RejectReason::MissingSpotifyId))?;

    let artists = credited_artists(raw.songs.as_ref(), raw.artist_name.as_deref())
        .map_err(reject)?;

    let song = Song {
        spotify_id: spotify_id.clone(),
        name: raw
            .songs
            .as_ref()
            .and_then(|s| s.name.clone())
            .unwrap_or_default(),
        features: raw.songs.as_ref().map(RawSong::features).unwrap_or_default(),
        artists,
    };
    let credits = dedup_credits(&song.artists);

    Ok(RankingRecord {
        spotify_id,
        daily_rank,
        snapshot_date,
        country: raw.countries.and_then(|c| c.country),
        song,
        credits,
    })
}

fn credited_artists(
    song: Option<&RawSong>,
    flat_name: Option<&str>,
) -> Result<Vec<Artist>, RejectReason> {
    let entries = match song.and_then(|s| s.song_artists.as_ref()) {
        Some(entries) => entries,
        None => {
            // Heatmap query variant: one flat artist name, no nested song
            return match flat_name.map(clean_name) {
                None | Some("") => Err(RejectReason::MissingArtists),
                Some(UNKNOWN_ARTIST) => Ok(Vec::new()),
                Some(name) => Ok(vec![Artist {
                    id: None,
                    name: name.to_string(),
                }]),
            };
        }
    };

    let mut artists = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let artist = entry
            .artists
            .as_ref()
            .ok_or(RejectReason::MalformedArtist { position })?;
        match artist.name.as_deref() {
            Some(name) if name.trim().is_empty() => {
                return Err(RejectReason::MalformedArtist { position })
            }
            Some(name) if clean_name(name) == UNKNOWN_ARTIST => {}
            Some(name) => artists.push(Artist {
                id: artist.id,
                name: name.to_string(),
            }),
            None => return Err(RejectReason::MalformedArtist { position }),
        }
    }
    Ok(artists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ArtistKey;
    use serde_json::json;

    fn row(rank: Value, date: &str, artists: Value) -> Value {
        json!({
            "spotify_id": "id1",
            "daily_rank": rank,
            "snapshot_date": date,
            "Songs": {"name": "Song", "Song_artists": artists}
        })
    }

    #[test]
    fn test_valid_row() {
        let batch = ingest_values(vec![row(
            json!(4),
            "2024-01-01",
            json!([{"Artists": {"name": " A "}}]),
        )]);
        assert!(batch.rejected.is_empty());
        let record = &batch.records[0];
        assert_eq!(record.daily_rank.get(), 4);
        assert_eq!(record.credits[0].key, ArtistKey::Name("A".into()));
        assert_eq!(record.credits[0].name, "A");
    }

    #[test]
    fn test_missing_rank_is_rejected_and_batch_continues() {
        let batch = ingest_values(vec![
            json!({"spotify_id": "x", "snapshot_date": "2024-01-01",
                   "Songs": {"Song_artists": []}}),
            row(json!(1), "2024-01-01", json!([{"Artists": {"name": "A"}}])),
        ]);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(
            batch.rejected,
            vec![InvalidRecord::new(0, RejectReason::MissingRank)]
        );
    }

    #[test]
    fn test_rank_out_of_range() {
        let batch = ingest_values(vec![row(json!(51), "2024-01-01", json!([]))]);
        assert_eq!(batch.rejected[0].reason, RejectReason::RankOutOfRange(51));
    }

    #[test]
    fn test_malformed_rank_type() {
        let batch = ingest_values(vec![row(json!("first"), "2024-01-01", json!([]))]);
        assert!(matches!(batch.rejected[0].reason, RejectReason::Malformed(_)));
    }

    #[test]
    fn test_malformed_artist_list() {
        let batch = ingest_values(vec![
            row(json!(2), "2024-01-01", json!("A, B")),
            row(json!(3), "2024-01-01", json!([{"Artists": null}])),
            row(json!(5), "2024-01-01", json!([{"Artists": {"name": "B"}}])),
        ]);
        assert_eq!(batch.records.len(), 1);
        assert!(matches!(batch.rejected[0].reason, RejectReason::Malformed(_)));
        assert_eq!(
            batch.rejected[1].reason,
            RejectReason::MalformedArtist { position: 0 }
        );
    }

    #[test]
    fn test_zero_artists_is_valid() {
        let batch = ingest_values(vec![row(json!(2), "2024-01-01", json!([]))]);
        assert!(batch.rejected.is_empty());
        assert!(batch.records[0].credits.is_empty());
    }

    #[test]
    fn test_missing_artist_data() {
        let batch = ingest_values(vec![json!({
            "spotify_id": "x", "daily_rank": 1, "snapshot_date": "2024-01-01"
        })]);
        assert_eq!(batch.rejected[0].reason, RejectReason::MissingArtists);
    }

    #[test]
    fn test_flat_artist_name_variant() {
        let batch = ingest_values(vec![json!({
            "spotify_id": "x", "daily_rank": 7, "snapshot_date": "2024-01-02",
            "artist_name": "Rosé "
        })]);
        let record = &batch.records[0];
        assert_eq!(record.credits[0].key, ArtistKey::Name("Rosé".into()));
    }

    #[test]
    fn test_bad_date_and_missing_id() {
        let batch = ingest_values(vec![
            row(json!(1), "yesterday", json!([])),
            json!({"daily_rank": 1, "snapshot_date": "2024-01-01",
                   "Songs": {"Song_artists": []}}),
            json!(42),
        ]);
        assert_eq!(
            batch.rejected[0].reason,
            RejectReason::InvalidDate("yesterday".into())
        );
        assert_eq!(batch.rejected[1].reason, RejectReason::MissingSpotifyId);
        assert!(matches!(batch.rejected[2].reason, RejectReason::Malformed(_)));
        assert!(batch.is_empty());
    }

    #[test]
    fn test_song_spotify_id_fallback() {
        let batch = ingest_values(vec![json!({
            "daily_rank": 9, "snapshot_date": "2024-01-01",
            "Songs": {"spotify_id": "nested", "Song_artists": []}
        })]);
        assert_eq!(batch.records[0].spotify_id, "nested");
    }

    #[test]
    fn test_unknown_artist_is_not_credited() {
        let batch = ingest_values(vec![
            json!({"spotify_id": "x", "daily_rank": 3, "snapshot_date": "2024-01-02",
                   "artist_name": "Unknown Artist"}),
            row(
                json!(4),
                "2024-01-02",
                json!([{"Artists": {"name": "Unknown Artist"}}, {"Artists": {"name": "A"}}]),
            ),
        ]);
        assert!(batch.rejected.is_empty());
        assert!(batch.records[0].credits.is_empty());
        let names: Vec<_> = batch.records[1].credits.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A"]);
    }

    #[test]
    fn test_undecodable_cell_is_malformed() {
        let raw = RawRanking {
            spotify_id: Some("x".into()),
            snapshot_date: Some("2024-01-01".into()),
            malformed: Some("daily_rank is not an integer".into()),
            ..RawRanking::default()
        };
        let err = validate(5, raw).unwrap_err();
        assert_eq!(err.index, 5);
        assert!(matches!(err.reason, RejectReason::Malformed(_)));
    }
}
