//! One dashboard session: the current batch, its derived views and the
//! user's selections.
//!
//! Derived views are computed on first use and kept until a different batch
//! is loaded. Loading the same `Arc<Batch>` again is a no-op.

use chrono::NaiveDate;
use once_cell::unsync::OnceCell;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{DashboardConfig, SelectionOnFetch};
use crate::heatmap::{
    build_series, display_order, distinct_dates, HeatmapSeries, HeatmapSeriesData, RankBand,
};
use crate::ingest::Batch;
use crate::key::{clean_name, ArtistKey};
use crate::models::{format_date, RankingRecord, Song};
use crate::scoring::{
    aggregate, rank_by_score, word_cloud, ArtistScore, FontScale, WordCloudEntry,
};
use crate::selection::Selection;
use crate::songlist::{
    radar_datasets, song_cards, visible_songs, DateCursor, DetailChart, RadarDataset,
    SelectedSongs, SongCard,
};

#[derive(Default)]
struct Views {
    scores: OnceCell<Vec<ArtistScore>>,
    word_cloud: OnceCell<Vec<WordCloudEntry>>,
    heatmap: OnceCell<Vec<HeatmapSeries>>,
}

pub struct Dashboard {
    config: DashboardConfig,
    batch: Arc<Batch>,
    views: Views,
    selection: Selection,
    picked: SelectedSongs,
    cursor: DateCursor,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            batch: Arc::new(Batch::default()),
            views: Views::default(),
            selection: Selection::default(),
            picked: SelectedSongs::default(),
            cursor: DateCursor::default(),
        }
    }

    /// Swap in a freshly fetched batch. Returns `false` when `batch` is the
    /// one already loaded.
    pub fn load(&mut self, batch: Arc<Batch>) -> bool {
        if Arc::ptr_eq(&self.batch, &batch) {
            debug!("batch unchanged, keeping cached views");
            return false;
        }

        info!(
            records = batch.records.len(),
            rejected = batch.rejected.len(),
            "loading ranking batch"
        );

        self.cursor.set_dates(distinct_dates(&batch.records));
        self.batch = batch;
        self.views = Views::default();

        if self.config.selection_on_fetch == SelectionOnFetch::Clear {
            self.selection.clear();
        }
        if self.config.clear_songs_on_fetch {
            self.picked.clear();
        }
        true
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn records(&self) -> &[RankingRecord] {
        &self.batch.records
    }

    // ------------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------------

    /// Scores in first-appearance order.
    pub fn scores(&self) -> &[ArtistScore] {
        self.views.scores.get_or_init(|| aggregate(&self.batch.records))
    }

    /// Word cloud entries, largest first.
    pub fn word_cloud(&self) -> &[WordCloudEntry] {
        self.views
            .word_cloud
            .get_or_init(|| word_cloud(&rank_by_score(self.scores().to_vec())))
    }

    pub fn heatmap(&self) -> &[HeatmapSeries] {
        self.views.heatmap.get_or_init(|| build_series(&self.batch.records))
    }

    pub fn heatmap_display(&self) -> Vec<&HeatmapSeries> {
        display_order(self.heatmap(), &self.selection, self.config.float_selected)
    }

    // ------------------------------------------------------------------------
    // Artist selection
    // ------------------------------------------------------------------------

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn toggle_artist(&mut self, key: ArtistKey) -> bool {
        self.selection.toggle(key)
    }

    /// Key of the artist displayed as `name` in the current batch.
    pub fn find_artist(&self, name: &str) -> Option<ArtistKey> {
        let name = clean_name(name);
        self.scores()
            .iter()
            .find(|s| s.display_name == name)
            .map(|s| s.key.clone())
    }

    // ------------------------------------------------------------------------
    // Song list
    // ------------------------------------------------------------------------

    pub fn cursor(&self) -> &DateCursor {
        &self.cursor
    }

    pub fn select_date_index(&mut self, index: usize) -> Option<NaiveDate> {
        self.cursor.select_index(index)
    }

    pub fn visible_songs(&self) -> Vec<&RankingRecord> {
        match self.cursor.effective_date() {
            Some(date) => visible_songs(&self.batch.records, date, &self.selection),
            None => Vec::new(),
        }
    }

    pub fn picked(&self) -> &SelectedSongs {
        &self.picked
    }

    pub fn toggle_song(&mut self, song: &Song) -> bool {
        self.picked.toggle(song)
    }

    /// Toggle a song of the current batch by id. `None` if no record has it.
    pub fn toggle_song_id(&mut self, spotify_id: &str) -> Option<bool> {
        let song = self
            .batch
            .records
            .iter()
            .find(|r| r.spotify_id == spotify_id)
            .map(|r| r.song.clone())?;
        Some(self.picked.toggle(&song))
    }

    pub fn clear_songs(&mut self) {
        self.picked.clear();
    }

    pub fn detail_chart(&self) -> DetailChart {
        self.picked.detail_chart(self.config.radar_limit)
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> DashboardSnapshot {
        let words = self.word_cloud();
        let scale = FontScale::for_entries(words);
        let heatmap = self.heatmap_display();

        DashboardSnapshot {
            dates: self.cursor.dates().iter().map(|d| format_date(*d)).collect(),
            effective_date: self.cursor.effective_date().map(format_date),
            slider_position: self.cursor.slider_position(),
            word_cloud: words
                .iter()
                .map(|w| WordView {
                    entry: w.clone(),
                    font_size: scale.size(w.value),
                    selected: self.selection.marks_word(w),
                })
                .collect(),
            heatmap: heatmap.iter().map(|s| HeatmapSeriesData::from(*s)).collect(),
            highlighted: self
                .selection
                .highlighted_names(self.heatmap())
                .into_iter()
                .map(str::to_string)
                .collect(),
            rank_bands: RankBand::ALL
                .iter()
                .map(|b| BandLegend {
                    band: *b,
                    range: b.range(),
                    color: b.color(),
                })
                .collect(),
            songs: song_cards(&self.visible_songs(), &self.picked),
            selected_artists: self.selection.clone(),
            selected_songs: self.picked.clone(),
            detail_chart: self.detail_chart(),
            detail: radar_datasets(self.picked.as_slice()),
            rejected_rows: self.batch.rejected.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordView {
    #[serde(flatten)]
    pub entry: WordCloudEntry,
    pub font_size: f64,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandLegend {
    pub band: RankBand,
    pub range: Option<(u8, u8)>,
    pub color: Option<&'static str>,
}

/// Everything the rendering layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub dates: Vec<String>,
    pub effective_date: Option<String>,
    pub slider_position: Option<usize>,
    pub word_cloud: Vec<WordView>,
    pub heatmap: Vec<HeatmapSeriesData>,
    pub highlighted: Vec<String>,
    pub rank_bands: Vec<BandLegend>,
    pub songs: Vec<SongCard>,
    pub selected_artists: Selection,
    pub selected_songs: SelectedSongs,
    pub detail_chart: DetailChart,
    pub detail: Vec<RadarDataset>,
    pub rejected_rows: usize,
}
