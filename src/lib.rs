//! # anotanusa
//!
//! Response tracking and consensus aggregation for crowdsourced text
//! annotation (classification, text-to-text generation and ranking).
//!
//! This library provides:
//! - A per-annotator response tracker with buffered edits and debounced saves
//! - Task stores (in-memory and JSON documents on disk)
//! - Pure aggregation of every annotator's answers into consensus views
//! - CSV / JSON export of the aggregated results
//!
//! ## Example
//!
//! ```rust,ignore
//! use anotanusa::{config::TrackerConfig, model::Answer, tracker::ResponseTracker};
//!
//! let mut tracker = ResponseTracker::initialize(store, &task_id, "alice", TrackerConfig::default()).await?;
//! tracker.set_answer(tracker.current_index() - 1, Some(Answer::Classification("Positive".into())))?;
//! tracker.go_to_next().await?;
//! ```

pub mod aggregate;
pub mod config;
pub mod export;
pub mod model;
pub mod store;
pub mod tracker;

pub use config::Config;
pub use tracker::{ResponseTracker, TrackerError};
