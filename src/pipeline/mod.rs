//! Detect, crop, identify and enrich.

mod processor;

pub use processor::IdentificationPipeline;

use serde::{Deserialize, Serialize};

/// One identified insect as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedInsect {
    /// Probability of the top identification candidate.
    pub probability: f64,
    /// Scientific name, or "Unknown".
    pub latin_name: String,
    /// GBIF species key; `null` when unknown or the lookup failed.
    pub gbif_id: Option<i64>,
}

/// Highest probability among `insects`, or `None` when empty.
pub fn max_probability(insects: &[IdentifiedInsect]) -> Option<f64> {
    insects
        .iter()
        .map(|insect| insect.probability)
        .max_by(f64::total_cmp)
}
