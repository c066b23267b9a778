//! Row-level validation errors.
//!
//! Nothing here is fatal: ingestion collects these next to the valid records
//! and keeps going.

use thiserror::Error;

/// Why a fetched row could not become a `RankingRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("malformed row: {0}")]
    Malformed(String),

    #[error("missing daily_rank")]
    MissingRank,

    #[error("daily_rank {0} outside 1..=50")]
    RankOutOfRange(i64),

    #[error("missing snapshot_date")]
    MissingDate,

    #[error("unparseable snapshot_date '{0}'")]
    InvalidDate(String),

    #[error("missing spotify_id")]
    MissingSpotifyId,

    #[error("missing artist data")]
    MissingArtists,

    #[error("artist credit {position} has no usable name")]
    MalformedArtist { position: usize },
}

/// A rejected row, with its position in the fetched batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid record at row {index}: {reason}")]
pub struct InvalidRecord {
    pub index: usize,
    pub reason: RejectReason,
}

impl InvalidRecord {
    pub fn new(index: usize, reason: RejectReason) -> Self {
        Self { index, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_row_and_reason() {
        let err = InvalidRecord::new(7, RejectReason::RankOutOfRange(51));
        assert_eq!(
            err.to_string(),
            "invalid record at row 7: daily_rank 51 outside 1..=50"
        );
    }
}
