//! catsearch-query - Hybrid retrieval and ranking engine
//!
//! This crate runs the per-query pipeline: candidate retrieval from the
//! lexical/graph store and the semantic vector store in parallel, per-source
//! min-max normalization, and adaptive weighted rank fusion.
//!
//! # Example
//!
//! ```rust,ignore
//! use catsearch_query::SearchEngine;
//! use catsearch_core::SearchTuning;
//! use std::sync::Arc;
//!
//! let engine = SearchEngine::connect(
//!     Arc::new(lexical_store),
//!     Arc::new(vector_store),
//!     Arc::new(embedder),
//!     SearchTuning::default(),
//! )
//! .await?;
//! let results = engine.search("wireless headphones", 10, None).await?;
//! ```

mod engine;
mod fusion;
mod lexical;
mod normalize;
mod semantic;

pub use engine::SearchEngine;
pub use fusion::FusionEngine;
pub use lexical::LexicalRetriever;
pub use normalize::min_max;
pub use semantic::SemanticRetriever;

// Re-export for convenience
pub use catsearch_core::{RankedHit, SearchResults};
