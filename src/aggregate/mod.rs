//! Consensus views over every annotator's answers.
//!
//! All functions here are pure. Answers that are missing, blank or shaped
//! for a different task type count as "no vote"; nothing in this module
//! fails on legacy data.
//!
//! Annotators are visited in the order of `responses_by_user`, which is the
//! stored document order. Ties are broken by that order (first encountered
//! wins) unless a function documents otherwise.

pub mod classification;
pub mod generation;
pub mod participation;
pub mod ranking;

pub use classification::{
    classification_distribution, global_classification_distribution, Distribution,
};
pub use generation::{generation_responses, response_stats, GenerationResponse, ResponseStats};
pub use participation::{participation_stats, ParticipationStats};
pub use ranking::{global_rank_aggregate, rank_aggregate, rank_summary, RankSummary, RankedChoice};

/// Round to a fixed number of decimal places, as displayed and exported.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
