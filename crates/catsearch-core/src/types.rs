//! Core domain types for the catalog search engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A key/value attribute attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key, e.g. "capacity".
    pub key: String,

    /// Attribute value, e.g. "5 tons".
    pub value: String,
}

impl Attribute {
    /// Create a new attribute.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A normalized product record as produced by the catalog extraction
/// pipeline. Both backing stores are populated from these before the engine
/// runs and share the same `id` space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Unique product identifier (e.g. a catalog SKU or model number).
    pub id: String,

    /// Product display name.
    pub name: String,

    /// One-line description.
    #[serde(default)]
    pub short_description: String,

    /// Full description.
    #[serde(default)]
    pub description: String,

    /// Key/value attributes.
    #[serde(default)]
    pub attributes: Vec<Attribute>,

    /// Precomputed search-term list for exact term matching. The loader
    /// derives this when the extraction pipeline leaves it empty.
    #[serde(default)]
    pub search_terms: Vec<String>,
}

/// Per-source fusion weights, chosen per query and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    /// Weight for the lexical/attribute source, in [0, 1].
    pub lexical: f32,

    /// Weight for the semantic vector source, in [0, 1].
    pub semantic: f32,
}

impl FusionWeights {
    /// Create a weight pair.
    pub const fn new(lexical: f32, semantic: f32) -> Self {
        Self { lexical, semantic }
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

/// Accumulated scoring state for one product within one query.
///
/// Every field has an explicit zero default so fusion arithmetic never has
/// to branch on which source discovered the candidate. One candidate exists
/// per product id per query; candidates do not outlive the query.
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    /// Product identifier.
    pub id: String,

    /// Product name.
    pub name: String,

    /// Short description, if a lexical strategy returned one.
    pub description: String,

    /// Raw accumulated lexical score (strategy-weighted, additive).
    pub lexical_raw: f32,

    /// Min-max normalized lexical score in [0, 1].
    pub lexical_norm: f32,

    /// Raw semantic similarity.
    pub semantic_raw: f32,

    /// Min-max normalized semantic score in [0, 1].
    pub semantic_norm: f32,

    /// Which retrieval methods found this product.
    pub methods: BTreeSet<&'static str>,

    /// Name-similarity bonus applied during post-processing.
    pub fuzzy_bonus: f32,

    /// Word-overlap bonus applied during post-processing.
    pub overlap_bonus: f32,

    /// Final fused score.
    pub final_score: f32,
}

impl Candidate {
    /// Seed a candidate with identity fields only; all scores start at zero.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// One ranked product in a search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedHit {
    /// Result rank (1-indexed).
    pub rank: u32,

    /// Product identifier.
    pub id: String,

    /// Product name.
    pub name: String,

    /// Normalized lexical score contribution.
    pub lexical_score: f32,

    /// Normalized semantic score contribution.
    pub semantic_score: f32,

    /// Fuzzy name-similarity bonus, zero when not applied.
    pub fuzzy_bonus: f32,

    /// Final fused score.
    pub final_score: f32,

    /// Retrieval methods that surfaced this product.
    pub methods: Vec<String>,
}

/// Search response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// The original query.
    pub query: String,

    /// Total results returned.
    pub total_results: usize,

    /// Search latency in milliseconds.
    pub latency_ms: u64,

    /// Individual ranked results.
    pub results: Vec<RankedHit>,
}

impl SearchResults {
    /// An empty response for the given query (e.g. a blank query string).
    pub fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            total_results: 0,
            latency_ms: 0,
            results: Vec::new(),
        }
    }
}
