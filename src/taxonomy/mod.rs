//! Scientific name to GBIF species key lookup.
//!
//! Lookups are best-effort: every failure degrades to "no key" and is only
//! visible in the logs.

mod gbif;

pub use gbif::GbifClient;

use async_trait::async_trait;

/// Resolves a scientific name to a stable numeric species identifier.
#[async_trait]
pub trait TaxonomyLookup: Send + Sync {
    /// Species key for `latin_name`, or `None` when not found or unavailable.
    async fn species_key(&self, latin_name: &str) -> Option<i64>;
}

/// Lookup used when enrichment is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTaxonomy;

#[async_trait]
impl TaxonomyLookup for NoTaxonomy {
    async fn species_key(&self, _latin_name: &str) -> Option<i64> {
        None
    }
}
