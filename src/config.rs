//! Dashboard behaviour knobs, optionally loaded from a TOML file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// What loading a new batch does to the artist selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOnFetch {
    #[default]
    Keep,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub selection_on_fetch: SelectionOnFetch,
    pub clear_songs_on_fetch: bool,
    /// Most picked songs still drawn as a radar chart.
    pub radar_limit: usize,
    /// Row cap for ranking queries, 0 for none.
    pub row_limit: usize,
    pub float_selected: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            selection_on_fetch: SelectionOnFetch::Keep,
            clear_songs_on_fetch: false,
            radar_limit: 5,
            row_limit: 100,
            float_selected: true,
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn row_limit(&self) -> Option<usize> {
        (self.row_limit > 0).then_some(self.row_limit)
    }
}
