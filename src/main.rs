use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use spotivis::config::{DashboardConfig, SelectionOnFetch};
use spotivis::dashboard::Dashboard;
use spotivis::ingest::{ingest_rows, ingest_values, Batch};
use spotivis::key::ArtistKey;
use spotivis::models::format_date;
use spotivis::progress::{format_duration, set_log_only};
use spotivis::safety::validate_output_path;
use spotivis::source::{self, RankingQuery};

#[derive(Parser)]
#[command(name = "spotivis")]
#[command(about = "Aggregate daily Spotify top-50 charts into dashboard data")]
struct Args {
    /// TOML file with dashboard settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Hide progress bars, log lines only
    #[arg(long, global = true)]
    log_only: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List countries with chart data
    Countries {
        #[arg(long)]
        db: PathBuf,
    },
    /// Show the earliest and latest snapshot date
    Dates {
        #[arg(long)]
        db: PathBuf,
    },
    /// Render a dashboard snapshot as JSON
    Render(RenderArgs),
}

#[derive(ClapArgs)]
struct RenderArgs {
    /// Chart database (SQLite)
    #[arg(long, conflicts_with = "json", required_unless_present = "json")]
    db: Option<PathBuf>,

    /// Saved rankings response (JSON array)
    #[arg(long)]
    json: Option<PathBuf>,

    #[arg(long)]
    country: Option<i64>,

    #[arg(long)]
    start: Option<NaiveDate>,

    #[arg(long)]
    end: Option<NaiveDate>,

    /// Row cap, 0 for none (defaults to the config value)
    #[arg(long)]
    limit: Option<usize>,

    /// Select an artist by display name (repeatable)
    #[arg(long = "select")]
    select_names: Vec<String>,

    /// Select an artist by database id (repeatable)
    #[arg(long = "select-id")]
    select_ids: Vec<i64>,

    /// Pick a song for the detail chart by Spotify id (repeatable)
    #[arg(long = "song")]
    songs: Vec<String>,

    /// Move the date slider to this index
    #[arg(long)]
    date_index: Option<usize>,

    #[arg(long, value_enum)]
    selection_on_fetch: Option<SelectionOnFetch>,

    #[arg(long)]
    radar_limit: Option<usize>,

    /// Write the snapshot here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    set_log_only(args.log_only);

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            DashboardConfig::load(path)?
        }
        None => DashboardConfig::default(),
    };

    match args.command {
        Command::Countries { db } => print_countries(&db),
        Command::Dates { db } => print_dates(&db),
        Command::Render(render_args) => render(config, render_args),
    }
}

fn print_countries(db: &Path) -> Result<()> {
    let conn = source::open(db)?;
    let countries = source::list_countries(&conn)?;
    for c in &countries {
        println!(
            "[{}] {} {}",
            c.id,
            c.country,
            c.country_name.as_deref().unwrap_or("")
        );
    }
    if countries.is_empty() {
        println!("No countries found.");
    }
    Ok(())
}

fn print_dates(db: &Path) -> Result<()> {
    let conn = source::open(db)?;
    match source::date_bounds(&conn)? {
        Some(bounds) => println!("{} .. {}", format_date(bounds.min), format_date(bounds.max)),
        None => bail!("Could not fetch min/max dates: no rankings in {}", db.display()),
    }
    Ok(())
}

fn render(mut config: DashboardConfig, args: RenderArgs) -> Result<()> {
    let start = Instant::now();

    if let Some(policy) = args.selection_on_fetch {
        config.selection_on_fetch = policy;
    }
    if let Some(limit) = args.radar_limit {
        config.radar_limit = limit;
    }
    if let Some(limit) = args.limit {
        config.row_limit = limit;
    }

    if let Some(output) = &args.output {
        let sources: Vec<&Path> = args.db.iter().chain(args.json.iter()).map(PathBuf::as_path).collect();
        validate_output_path(output, &sources)?;
    }

    let batch = load_batch(&config, &args)?;
    let mut dashboard = Dashboard::new(config);
    dashboard.load(Arc::new(batch));
    if !dashboard.batch().rejected.is_empty() {
        warn!(rejected = dashboard.batch().rejected.len(), "some ranking rows were skipped");
    }

    for name in &args.select_names {
        let key = dashboard.find_artist(name).unwrap_or_else(|| {
            warn!("Artist '{}' not in this batch, selecting by name", name.trim());
            ArtistKey::resolve(None, name)
        });
        dashboard.toggle_artist(key);
    }
    for id in &args.select_ids {
        dashboard.toggle_artist(ArtistKey::Id(*id));
    }

    if let Some(index) = args.date_index {
        if dashboard.select_date_index(index).is_none() {
            bail!(
                "Date index {} out of range ({} dates in batch)",
                index,
                dashboard.cursor().dates().len()
            );
        }
    }

    for spotify_id in &args.songs {
        if dashboard.toggle_song_id(spotify_id).is_none() {
            warn!("Song '{}' not in this batch", spotify_id);
        }
    }

    let json = serde_json::to_string_pretty(&dashboard.snapshot())?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote snapshot to {}", path.display());
        }
        None => println!("{}", json),
    }

    info!(
        records = dashboard.records().len(),
        artists = dashboard.scores().len(),
        elapsed = %format_duration(start.elapsed()),
        "render complete"
    );
    Ok(())
}

fn load_batch(config: &DashboardConfig, args: &RenderArgs) -> Result<Batch> {
    if let Some(db) = &args.db {
        let conn = source::open(db)?;
        let query = RankingQuery {
            country_id: args.country,
            start: args.start,
            end: args.end,
            limit: config.row_limit(),
        };
        return Ok(ingest_rows(source::load_rankings(&conn, &query)?));
    }

    let Some(path) = &args.json else {
        bail!("Either --db or --json is required");
    };
    if args.country.is_some() || args.start.is_some() || args.end.is_some() {
        warn!("--country/--start/--end only apply to --db; the JSON file is used as is");
    }
    let mut rows = source::load_json_rows(path)?;
    if let Some(limit) = config.row_limit() {
        rows.truncate(limit);
    }
    Ok(ingest_values(rows))
}
