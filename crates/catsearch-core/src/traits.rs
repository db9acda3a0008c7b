//! Traits defining the seams between the engine and its collaborators.
//!
//! The engine never owns a storage or embedding implementation; it holds
//! read-only handles behind these traits, initialized once at construction
//! and safe for concurrent use.

use async_trait::async_trait;

use crate::error::Result;

/// Row returned by the precomputed term-list strategy.
#[derive(Debug, Clone)]
pub struct TermListMatch {
    pub id: String,
    pub name: String,
    pub description: String,

    /// Number of supplied terms present in the product's term list.
    pub matched_terms: u32,
}

/// Row returned by the full-text relevance strategy.
#[derive(Debug, Clone)]
pub struct FullTextMatch {
    pub id: String,
    pub name: String,
    pub description: String,

    /// Store-provided relevance score.
    pub relevance: f32,
}

/// Row returned by the attribute substring strategy.
#[derive(Debug, Clone)]
pub struct AttributeMatch {
    pub id: String,
    pub name: String,
    pub description: String,

    /// Count of distinct attributes whose key or value matched.
    pub matched_attributes: u32,
}

/// Row returned by a nearest-neighbor lookup.
#[derive(Debug, Clone)]
pub struct NeighborMatch {
    pub id: String,
    pub name: String,

    /// Cosine similarity in [0, 1].
    pub similarity: f32,
}

/// Lexical/graph store seam.
///
/// Implementations index products, free text, and key/value attribute pairs
/// and expose the three query shapes the lexical retriever fans out over.
/// All calls accept a result-count bound.
#[async_trait]
pub trait LexicalStore: Send + Sync {
    /// Number of products indexed. Used as the construction-time probe; an
    /// error here is a connectivity failure.
    async fn count(&self) -> Result<u64>;

    /// Products whose precomputed search-term list intersects `terms`,
    /// scored by intersection size, descending.
    async fn match_search_terms(&self, terms: &[String], limit: usize)
        -> Result<Vec<TermListMatch>>;

    /// Full-text relevance query over name, description, and search terms.
    /// `fuzzy` requests tolerant per-token matching.
    async fn full_text(&self, query: &str, fuzzy: bool, limit: usize)
        -> Result<Vec<FullTextMatch>>;

    /// Products reachable through an attribute whose key or value contains,
    /// or is contained by, any of `terms`; scored by the count of distinct
    /// matching attributes, descending.
    async fn match_attributes(&self, terms: &[String], limit: usize)
        -> Result<Vec<AttributeMatch>>;
}

/// Vector similarity store seam.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Number of vectors indexed. Used as the construction-time probe.
    async fn count(&self) -> Result<u64>;

    /// Nearest neighbors of `vector` under cosine similarity, descending.
    async fn nearest(&self, vector: &[f32], limit: usize) -> Result<Vec<NeighborMatch>>;
}

/// Embedding function seam: deterministic text to fixed-dimension vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}
