//! Topic / sub-topic / question practice sheet with derived progress,
//! one-shot hydration from a flat question feed, and SQLite snapshots.

pub mod app;
pub mod cli;
pub mod completions;
pub mod config;
pub mod db;
pub mod domain;
pub mod feed;
pub mod hydration;
pub mod ids;
pub mod listing;
pub mod logging;
pub mod normalize;
pub mod reorder;
pub mod snapshot;
pub mod store;
pub mod ui;
