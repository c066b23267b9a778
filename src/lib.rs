//! Spotify chart aggregation for the spotivis dashboard.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod heatmap;
pub mod ingest;
pub mod key;
pub mod models;
pub mod progress;
pub mod safety;
pub mod scoring;
pub mod selection;
pub mod songlist;
pub mod source;
