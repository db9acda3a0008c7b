//! The search engine: a stateless per-query pipeline over long-lived,
//! read-only store handles.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{debug, info, warn};

use catsearch_analyze::{build_matcher, QueryAnalyzer, TermNormalizer};
use catsearch_core::{
    Candidate, Embedder, FusionWeights, LexicalStore, RankedHit, Result, SearchError,
    SearchResults, SearchTuning, VectorStore,
};

use crate::fusion::FusionEngine;
use crate::lexical::LexicalRetriever;
use crate::semantic::SemanticRetriever;

/// Hybrid catalog search engine.
///
/// Holds `Arc` handles to the two stores and the embedder, initialized once
/// at construction and never mutated. Each `search()` call is an
/// independent pipeline instance; no state is carried between queries, so
/// concurrent calls are safe.
pub struct SearchEngine<L, V, E> {
    lexical: LexicalRetriever<L>,
    semantic: SemanticRetriever<V, E>,
    analyzer: QueryAnalyzer,
    normalizer: Arc<TermNormalizer>,
    fusion: FusionEngine,
    tuning: SearchTuning,
}

impl<L, V, E> std::fmt::Debug for SearchEngine<L, V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine").finish_non_exhaustive()
    }
}

impl<L, V, E> SearchEngine<L, V, E>
where
    L: LexicalStore,
    V: VectorStore,
    E: Embedder,
{
    /// Construct the engine, probing both stores.
    ///
    /// An unreachable store is fatal here and only here; once constructed,
    /// every failure degrades per query instead.
    pub async fn connect(
        lexical_store: Arc<L>,
        vector_store: Arc<V>,
        embedder: Arc<E>,
        tuning: SearchTuning,
    ) -> Result<Self> {
        let products = lexical_store
            .count()
            .await
            .map_err(|e| SearchError::connectivity("lexical store", e.to_string()))?;
        if products == 0 {
            return Err(SearchError::connectivity(
                "lexical store",
                "no products indexed; load the catalog first",
            ));
        }
        let vectors = vector_store
            .count()
            .await
            .map_err(|e| SearchError::connectivity("vector store", e.to_string()))?;

        info!(
            products,
            vectors,
            dimension = embedder.dimension(),
            "search engine connected"
        );

        let matcher = build_matcher(tuning.matcher.kind);
        let normalizer = Arc::new(TermNormalizer::new(matcher));

        Ok(Self {
            lexical: LexicalRetriever::new(lexical_store, tuning.lexical.clone()),
            semantic: SemanticRetriever::new(vector_store, embedder),
            analyzer: QueryAnalyzer::new(tuning.weights.clone()),
            normalizer: Arc::clone(&normalizer),
            fusion: FusionEngine::new(tuning.fusion.clone(), normalizer),
            tuning,
        })
    }

    /// Run one hybrid search.
    ///
    /// Returns at most `limit` hits ordered by descending fused score, ties
    /// broken by ascending product id. A blank query returns an empty
    /// result immediately; total failure of both sources also yields an
    /// empty result, never an error.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        weight_override: Option<FusionWeights>,
    ) -> Result<SearchResults> {
        let start = Instant::now();
        let trimmed = query.trim();

        if trimmed.is_empty() {
            return Ok(SearchResults::empty(query));
        }

        info!("searching: {trimmed:?}");

        let analysis = self.analyzer.analyze(trimmed);
        let weights = weight_override.unwrap_or_else(|| self.analyzer.weights_for(&analysis));
        let terms = self.normalizer.normalize(trimmed, &analysis);

        debug!(
            has_code = analysis.has_product_code,
            descriptive = analysis.is_descriptive,
            attributes = analysis.has_attributes,
            lexical_weight = weights.lexical,
            semantic_weight = weights.semantic,
            "query analyzed"
        );

        let pool = self.tuning.limits.candidate_pool;
        let deadline = Duration::from_millis(self.tuning.limits.timeout_ms);

        let fused = if analysis.has_product_code {
            // Code short-circuit: exact lexical matching only
            let lexical = match timeout(deadline, self.lexical.retrieve(trimmed, &terms, pool))
                .await
            {
                Ok(candidates) => candidates,
                Err(_) => {
                    warn!("lexical retrieval timed out");
                    Vec::new()
                }
            };
            self.fusion
                .fuse_code(lexical, limit.min(self.tuning.limits.code_limit))
        } else {
            let (lexical, semantic) = tokio::join!(
                timeout(deadline, self.lexical.retrieve(trimmed, &terms, pool)),
                timeout(deadline, self.semantic.retrieve(trimmed, pool)),
            );

            let lexical = lexical.unwrap_or_else(|_| {
                warn!("lexical retrieval timed out");
                Vec::new()
            });
            let semantic = semantic.unwrap_or_else(|_| {
                warn!("semantic retrieval timed out");
                Vec::new()
            });

            debug!(
                lexical = lexical.len(),
                semantic = semantic.len(),
                "sources retrieved"
            );

            self.fusion.fuse(
                trimmed,
                weights,
                lexical,
                semantic,
                limit.min(self.tuning.limits.fuzzy_limit),
            )
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        let results = build_hits(fused);

        info!(
            total = results.len(),
            latency_ms, "search completed"
        );

        Ok(SearchResults {
            query: trimmed.to_string(),
            total_results: results.len(),
            latency_ms,
            results,
        })
    }

    /// The tuning this engine was constructed with.
    pub fn tuning(&self) -> &SearchTuning {
        &self.tuning
    }
}

fn build_hits(candidates: Vec<Candidate>) -> Vec<RankedHit> {
    candidates
        .into_iter()
        .enumerate()
        .map(|(i, c)| RankedHit {
            rank: i as u32 + 1,
            id: c.id,
            name: c.name,
            lexical_score: c.lexical_norm,
            semantic_score: c.semantic_norm,
            fuzzy_bonus: c.fuzzy_bonus,
            final_score: c.final_score,
            methods: c.methods.iter().map(|m| m.to_string()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use catsearch_core::{Attribute, NeighborMatch, ProductRecord};
    use catsearch_memory::{HashEmbedder, MemoryCatalog};

    fn product(
        id: &str,
        name: &str,
        short: &str,
        attributes: Vec<(&str, &str)>,
    ) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name: name.to_string(),
            short_description: short.to_string(),
            description: String::new(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| Attribute::new(k, v))
                .collect(),
            search_terms: Vec::new(),
        }
    }

    fn catalog() -> Vec<ProductRecord> {
        vec![
            product(
                "P-100",
                "CX-112 Coaxial Connector",
                "Gold plated coaxial connector",
                vec![("type", "connector"), ("plating", "gold")],
            ),
            product(
                "P-200",
                "Wireless Headphones",
                "Over-ear wireless headphones with noise cancelling",
                vec![("type", "headphones"), ("connectivity", "wireless")],
            ),
            product(
                "P-300",
                "Mobile Crane",
                "Compact mobile crane",
                vec![("capacity", "5 tons"), ("category", "lifting")],
            ),
            product(
                "P-400",
                "USB Charging Cable",
                "Braided usb charging cable",
                vec![("length", "2m")],
            ),
        ]
    }

    async fn engine() -> SearchEngine<
        catsearch_memory::MemoryLexicalStore,
        catsearch_memory::MemoryVectorStore,
        HashEmbedder,
    > {
        let embedder = Arc::new(HashEmbedder::new(64));
        let catalog = MemoryCatalog::build(catalog(), embedder.as_ref())
            .await
            .unwrap();
        SearchEngine::connect(
            catalog.lexical,
            catalog.vector,
            embedder,
            SearchTuning::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_query_short_circuits() {
        let engine = engine().await;
        let results = engine.search("   ", 10, None).await.unwrap();
        assert_eq!(results.total_results, 0);
        assert!(results.results.is_empty());
    }

    #[tokio::test]
    async fn test_code_query_finds_exact_product() {
        let engine = engine().await;
        let results = engine.search("CX-112", 10, None).await.unwrap();

        assert!(!results.results.is_empty());
        assert_eq!(results.results[0].id, "P-100");
        // Code short-circuit: the semantic source is never consulted
        for hit in &results.results {
            assert_eq!(hit.semantic_score, 0.0);
            assert!(!hit.methods.iter().any(|m| m == "semantic"));
        }
    }

    #[tokio::test]
    async fn test_code_query_separator_variants_match() {
        let engine = engine().await;
        for variant in ["cx112", "CX 112", "cx_112"] {
            let results = engine.search(variant, 10, None).await.unwrap();
            assert!(
                results.results.first().map(|h| h.id.as_str()) == Some("P-100"),
                "variant {variant} did not surface P-100"
            );
        }
    }

    #[tokio::test]
    async fn test_general_query_ranks_relevant_product_first() {
        let engine = engine().await;
        let results = engine.search("wireless headphones", 10, None).await.unwrap();

        assert!(!results.results.is_empty());
        assert_eq!(results.results[0].id, "P-200");
    }

    #[tokio::test]
    async fn test_misspelled_query_still_matches() {
        let engine = engine().await;
        let results = engine.search("wirless headphones", 10, None).await.unwrap();

        assert!(results
            .results
            .iter()
            .any(|h| h.id == "P-200"));
    }

    #[tokio::test]
    async fn test_attribute_query_matches_attribute_values() {
        let engine = engine().await;
        let results = engine.search("capacity: 5 tons", 10, None).await.unwrap();

        assert!(results.results.iter().any(|h| h.id == "P-300"));
    }

    #[tokio::test]
    async fn test_scores_in_range_and_limit_respected() {
        let engine = engine().await;
        for query in ["wireless headphones", "CX-112", "crane", "usb cable"] {
            let results = engine.search(query, 2, None).await.unwrap();
            assert!(results.results.len() <= 2, "limit exceeded for {query}");
            for hit in &results.results {
                assert!((0.0..=1.0).contains(&hit.lexical_score));
                assert!((0.0..=1.0).contains(&hit.semantic_score));
                assert!(hit.final_score.is_finite());
            }
        }
    }

    #[tokio::test]
    async fn test_results_ordered_non_increasing() {
        let engine = engine().await;
        let results = engine.search("charging cable", 10, None).await.unwrap();
        for pair in results.results.windows(2) {
            assert!(pair[0].final_score >= pair[1].final_score);
        }
    }

    #[tokio::test]
    async fn test_idempotence() {
        let engine = engine().await;
        let a = engine.search("wireless headphones", 10, None).await.unwrap();
        let b = engine.search("wireless headphones", 10, None).await.unwrap();

        let ids_a: Vec<_> = a.results.iter().map(|h| (&h.id, h.final_score)).collect();
        let ids_b: Vec<_> = b.results.iter().map(|h| (&h.id, h.final_score)).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[tokio::test]
    async fn test_weight_override_is_honored() {
        let engine = engine().await;
        // Forcing all weight onto the lexical side must still work
        let results = engine
            .search(
                "wireless headphones",
                10,
                Some(FusionWeights::new(1.0, 0.0)),
            )
            .await
            .unwrap();
        assert!(!results.results.is_empty());
    }

    /// A vector store that always fails; the engine must degrade to the
    /// lexical signal alone.
    struct FailingVectorStore;

    #[async_trait]
    impl VectorStore for FailingVectorStore {
        async fn count(&self) -> catsearch_core::Result<u64> {
            Ok(0)
        }

        async fn nearest(
            &self,
            _vector: &[f32],
            _limit: usize,
        ) -> catsearch_core::Result<Vec<NeighborMatch>> {
            Err(SearchError::store("vector index offline"))
        }
    }

    #[tokio::test]
    async fn test_graceful_degradation_without_semantic_source() {
        let embedder = Arc::new(HashEmbedder::new(64));
        let catalog = MemoryCatalog::build(catalog(), embedder.as_ref())
            .await
            .unwrap();
        let engine = SearchEngine::connect(
            catalog.lexical,
            Arc::new(FailingVectorStore),
            embedder,
            SearchTuning::default(),
        )
        .await
        .unwrap();

        let results = engine.search("wireless headphones", 10, None).await.unwrap();

        assert!(!results.results.is_empty());
        assert_eq!(results.results[0].id, "P-200");
        for pair in results.results.windows(2) {
            assert!(pair[0].final_score >= pair[1].final_score);
        }
        for hit in &results.results {
            assert!(hit.final_score.is_finite());
            assert_eq!(hit.semantic_score, 0.0);
        }
    }

    /// A lexical store whose count fails: construction must abort.
    struct UnreachableLexicalStore;

    #[async_trait]
    impl LexicalStore for UnreachableLexicalStore {
        async fn count(&self) -> catsearch_core::Result<u64> {
            Err(SearchError::store("connection refused"))
        }

        async fn match_search_terms(
            &self,
            _terms: &[String],
            _limit: usize,
        ) -> catsearch_core::Result<Vec<catsearch_core::TermListMatch>> {
            Ok(Vec::new())
        }

        async fn full_text(
            &self,
            _query: &str,
            _fuzzy: bool,
            _limit: usize,
        ) -> catsearch_core::Result<Vec<catsearch_core::FullTextMatch>> {
            Ok(Vec::new())
        }

        async fn match_attributes(
            &self,
            _terms: &[String],
            _limit: usize,
        ) -> catsearch_core::Result<Vec<catsearch_core::AttributeMatch>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_unreachable_store_is_fatal_at_construction() {
        let embedder = Arc::new(HashEmbedder::new(64));
        let catalog = MemoryCatalog::build(catalog(), embedder.as_ref())
            .await
            .unwrap();

        let err = SearchEngine::connect(
            Arc::new(UnreachableLexicalStore),
            catalog.vector,
            embedder,
            SearchTuning::default(),
        )
        .await
        .unwrap_err();

        assert!(err.is_fatal());
        assert!(err.to_string().contains("lexical store"));
    }
}
