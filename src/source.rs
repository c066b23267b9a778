//! Ranking rows from the chart database or a saved fetch response.
//!
//! Reads the `Countries` / `Rankings` / `Songs` / `Song_artists` / `Artists`
//! schema and produces the same row shape the HTTP fetch layer returns, so
//! both paths go through the same ingestion.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::info;

use crate::models::{
    format_date, parse_snapshot_date, Country, RawArtist, RawCountry, RawRanking, RawSong,
    RawSongArtist,
};
use crate::progress::{row_progress, spinner};

/// Filters forwarded by the dashboard's date picker and country page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankingQuery {
    pub country_id: Option<i64>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub limit: Option<usize>,
}

impl RankingQuery {
    fn where_clause(&self) -> (String, Vec<SqlValue>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(id) = self.country_id {
            conditions.push("r.country_id = ?");
            params.push(SqlValue::Integer(id));
        }
        if let Some(start) = self.start {
            conditions.push("date(r.snapshot_date) >= ?");
            params.push(SqlValue::Text(format_date(start)));
        }
        if let Some(end) = self.end {
            conditions.push("date(r.snapshot_date) <= ?");
            params.push(SqlValue::Text(format_date(end)));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, params)
    }
}

/// Earliest and latest snapshot in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

pub fn open(path: &Path) -> Result<Connection> {
    Connection::open(path)
        .with_context(|| format!("Failed to open chart database {}", path.display()))
}

pub fn list_countries(conn: &Connection) -> Result<Vec<Country>> {
    let mut stmt = conn.prepare("SELECT id, country, country_name FROM Countries ORDER BY country")?;
    let countries = stmt
        .query_map([], |row| {
            Ok(Country {
                id: row.get(0)?,
                country: row.get(1)?,
                country_name: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(countries)
}

/// `None` when there are no rankings at all.
pub fn date_bounds(conn: &Connection) -> Result<Option<DateBounds>> {
    let (min, max): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(date(snapshot_date)), MAX(date(snapshot_date)) FROM Rankings",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    match (min, max) {
        (Some(min), Some(max)) => {
            let min = parse_snapshot_date(&min)
                .with_context(|| format!("Unparseable snapshot_date '{}'", min))?;
            let max = parse_snapshot_date(&max)
                .with_context(|| format!("Unparseable snapshot_date '{}'", max))?;
            Ok(Some(DateBounds { min, max }))
        }
        _ => Ok(None),
    }
}

/// Ranking rows with their songs and credited artists, oldest date first and
/// best rank first within a day.
pub fn load_rankings(conn: &Connection, query: &RankingQuery) -> Result<Vec<RawRanking>> {
    let (clause, params) = query.where_clause();

    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM Rankings r {}", clause),
        params_from_iter(params.iter()),
        |row| row.get(0),
    )?;
    let expected = match query.limit {
        Some(limit) => (count as usize).min(limit),
        None => count as usize,
    };

    let artists = load_credits(conn, &clause, &params)?;

    let limit_sql = match query.limit {
        Some(limit) => format!("LIMIT {}", limit),
        None => String::new(),
    };
    let sql = format!(
        "SELECT r.spotify_id, r.daily_rank, r.snapshot_date, c.country,
                s.spotify_id, s.name, s.energy, s.danceability, s.valence,
                s.acousticness, s.instrumentalness, s.liveness, s.loudness, s.popularity
         FROM Rankings r
         LEFT JOIN Countries c ON c.id = r.country_id
         LEFT JOIN Songs s ON s.spotify_id = r.spotify_id
         {}
         ORDER BY r.snapshot_date ASC, r.daily_rank ASC
         {}",
        clause, limit_sql
    );

    let pb = row_progress(expected as u64, "Reading rankings");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut rankings = Vec::with_capacity(expected);

    while let Some(row) = rows.next()? {
        let spotify_id = text_cell(row.get(0)?);
        let (daily_rank, malformed) = match row.get::<_, SqlValue>(1)? {
            SqlValue::Null => (None, None),
            value => match int_cell(&value) {
                Some(rank) => (Some(rank), None),
                None => (None, Some(format!("daily_rank {:?} is not an integer", value))),
            },
        };

        let songs = match text_cell(row.get(4)?) {
            Some(id) => Some(RawSong {
                song_artists: Some(artists.get(&id).cloned().unwrap_or_default()),
                name: text_cell(row.get(5)?),
                energy: real_cell(row.get(6)?),
                danceability: real_cell(row.get(7)?),
                valence: real_cell(row.get(8)?),
                acousticness: real_cell(row.get(9)?),
                instrumentalness: real_cell(row.get(10)?),
                liveness: real_cell(row.get(11)?),
                loudness: real_cell(row.get(12)?),
                popularity: real_cell(row.get(13)?),
                spotify_id: Some(id),
            }),
            // Ranking without a Songs row: ingestion rejects it
            None => None,
        };

        rankings.push(RawRanking {
            spotify_id,
            daily_rank,
            snapshot_date: text_cell(row.get(2)?),
            countries: Some(RawCountry {
                country: text_cell(row.get(3)?),
            }),
            songs,
            artist_name: None,
            malformed,
        });
        pb.inc(1);
    }

    pb.finish_with_message(format!("Read {} ranking rows", rankings.len()));
    info!(rows = rankings.len(), "loaded rankings");
    Ok(rankings)
}

/// Credited artists per song for every song the filter can return, in
/// credit order.
fn load_credits(
    conn: &Connection,
    clause: &str,
    params: &[SqlValue],
) -> Result<FxHashMap<String, Vec<RawSongArtist>>> {
    let pb = spinner("Reading artist credits");

    let sql = format!(
        "SELECT sa.spotify_id, a.id, a.name
         FROM Song_artists sa
         JOIN Artists a ON a.id = sa.artist_id
         WHERE sa.spotify_id IN (SELECT DISTINCT r.spotify_id FROM Rankings r {})
         ORDER BY sa.rowid",
        clause
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(params.iter()))?;

    let mut credits: FxHashMap<String, Vec<RawSongArtist>> = FxHashMap::default();
    while let Some(row) = rows.next()? {
        let Some(spotify_id) = text_cell(row.get(0)?) else {
            continue;
        };
        credits.entry(spotify_id).or_default().push(RawSongArtist {
            artists: Some(RawArtist {
                id: int_cell(&row.get(1)?),
                name: text_cell(row.get(2)?),
            }),
        });
    }

    pb.finish_with_message(format!("Read credits for {} songs", credits.len()));
    Ok(credits)
}

// SQLite columns carry no enforced type, so cells are decoded leniently and
// ingestion decides whether the row survives.

fn int_cell(value: &SqlValue) -> Option<i64> {
    match value {
        SqlValue::Integer(i) => Some(*i),
        SqlValue::Real(f) if f.fract() == 0.0 => Some(*f as i64),
        SqlValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn real_cell(value: SqlValue) -> Option<f64> {
    match value {
        SqlValue::Integer(i) => Some(i as f64),
        SqlValue::Real(f) => Some(f),
        SqlValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_cell(value: SqlValue) -> Option<String> {
    match value {
        SqlValue::Text(s) => Some(s),
        SqlValue::Integer(i) => Some(i.to_string()),
        SqlValue::Real(f) => Some(f.to_string()),
        _ => None,
    }
}

/// Rows from a saved fetch response: a top-level JSON array.
pub fn load_json_rows(path: &Path) -> Result<Vec<Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    match value {
        Value::Array(rows) => Ok(rows),
        Value::Object(obj) if obj.contains_key("error") => {
            bail!("Fetch response is an error: {}", obj["error"])
        }
        _ => bail!("Expected a JSON array of ranking rows in {}", path.display()),
    }
}
