//! Semantic retrieval: embed the raw query, find nearest neighbors.

use std::sync::Arc;

use catsearch_core::{Embedder, NeighborMatch, VectorStore};

/// Nearest-neighbor retrieval over the vector store.
///
/// The raw query text is embedded unmodified; no term normalization is
/// applied on this path. Any failure, embedding or lookup, degrades to an
/// empty result so the lexical side can still answer.
pub struct SemanticRetriever<V, E> {
    store: Arc<V>,
    embedder: Arc<E>,
}

impl<V, E> SemanticRetriever<V, E>
where
    V: VectorStore,
    E: Embedder,
{
    pub fn new(store: Arc<V>, embedder: Arc<E>) -> Self {
        Self { store, embedder }
    }

    /// Retrieve up to `limit` neighbors ordered by similarity descending.
    pub async fn retrieve(&self, query: &str, limit: usize) -> Vec<NeighborMatch> {
        let vector = match self.embedder.embed_query(query).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("embedding failed, semantic source skipped: {e}");
                return Vec::new();
            }
        };

        match self.store.nearest(&vector, limit).await {
            Ok(neighbors) => {
                tracing::debug!("semantic: {} neighbors", neighbors.len());
                neighbors
            }
            Err(e) => {
                tracing::warn!("vector lookup failed, semantic source skipped: {e}");
                Vec::new()
            }
        }
    }
}
