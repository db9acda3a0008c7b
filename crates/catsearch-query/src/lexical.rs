//! Lexical/attribute retrieval: three sub-strategies over the graph store,
//! merged into one additive per-product accumulator.

use std::collections::HashMap;
use std::sync::Arc;

use catsearch_analyze::TermSet;
use catsearch_core::{Candidate, LexicalConfig, LexicalStore};

/// Provenance tags recorded per candidate.
pub const METHOD_TERMS: &str = "terms";
pub const METHOD_FULLTEXT: &str = "fulltext";
pub const METHOD_ATTRIBUTE: &str = "attribute";

/// One weighted contribution from a sub-strategy.
struct Contribution {
    id: String,
    name: String,
    description: String,
    score: f32,
    method: &'static str,
}

/// Multi-strategy retrieval against the lexical store.
///
/// The three sub-strategies are independent read-only queries and run
/// concurrently. A failing sub-strategy is caught, logged, and contributes
/// nothing. The merge is additive and keyed by product id, so it does not
/// depend on which strategy finishes first.
pub struct LexicalRetriever<L> {
    store: Arc<L>,
    config: LexicalConfig,
}

impl<L> LexicalRetriever<L>
where
    L: LexicalStore,
{
    pub fn new(store: Arc<L>, config: LexicalConfig) -> Self {
        Self { store, config }
    }

    /// Retrieve candidates for one query. `terms` selects the matching mode:
    /// a code-query term set drives exact code matching at the code weight,
    /// while a fuzzy term set drives all three strategies.
    pub async fn retrieve(&self, query: &str, terms: &TermSet, limit: usize) -> Vec<Candidate> {
        let code_query = terms.is_code_query();

        let exact_terms: Vec<String> = if code_query {
            terms.product_codes.iter().cloned().collect()
        } else {
            terms.all_terms().into_iter().collect()
        };
        let fuzzy_terms: Vec<String> = terms.all_terms().into_iter().collect();

        let (term_hits, text_hits, attr_hits) = tokio::join!(
            self.match_terms(&exact_terms, code_query, limit),
            self.full_text(query, limit),
            self.match_attributes(&fuzzy_terms, limit),
        );

        let mut merged: HashMap<String, Candidate> = HashMap::new();
        for contribution in term_hits.into_iter().chain(text_hits).chain(attr_hits) {
            let entry = merged
                .entry(contribution.id.clone())
                .or_insert_with(|| Candidate::new(contribution.id.clone(), &contribution.name));
            if entry.description.is_empty() {
                entry.description = contribution.description;
            }
            entry.lexical_raw += contribution.score;
            entry.methods.insert(contribution.method);
        }

        tracing::debug!("lexical: {} candidates", merged.len());
        merged.into_values().collect()
    }

    /// Strategy A: exact term-list intersection.
    async fn match_terms(
        &self,
        terms: &[String],
        code_query: bool,
        limit: usize,
    ) -> Vec<Contribution> {
        if terms.is_empty() {
            return Vec::new();
        }

        let weight = if code_query {
            self.config.code_weight
        } else {
            self.config.term_weight
        };

        match self.store.match_search_terms(terms, limit).await {
            Ok(rows) => rows
                .into_iter()
                .map(|row| Contribution {
                    id: row.id,
                    name: row.name,
                    description: row.description,
                    score: row.matched_terms as f32 * weight,
                    method: METHOD_TERMS,
                })
                .collect(),
            Err(e) => {
                tracing::warn!("term-list strategy failed: {e}");
                Vec::new()
            }
        }
    }

    /// Strategy B: store full-text relevance, retried once with tolerant
    /// per-token matching when the strict pass comes back empty.
    async fn full_text(&self, query: &str, limit: usize) -> Vec<Contribution> {
        let rows = match self.store.full_text(query, false, limit).await {
            Ok(rows) if rows.is_empty() => {
                tracing::debug!("full-text strict pass empty, retrying fuzzy");
                match self.store.full_text(query, true, limit).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        tracing::warn!("full-text fuzzy retry failed: {e}");
                        Vec::new()
                    }
                }
            }
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("full-text strategy failed: {e}");
                Vec::new()
            }
        };

        rows.into_iter()
            .map(|row| Contribution {
                id: row.id,
                name: row.name,
                description: row.description,
                score: row.relevance * self.config.fulltext_weight,
                method: METHOD_FULLTEXT,
            })
            .collect()
    }

    /// Strategy C: attribute key/value substring matching.
    async fn match_attributes(&self, terms: &[String], limit: usize) -> Vec<Contribution> {
        if terms.is_empty() {
            return Vec::new();
        }

        match self.store.match_attributes(terms, limit).await {
            Ok(rows) => rows
                .into_iter()
                .map(|row| Contribution {
                    id: row.id,
                    name: row.name,
                    description: row.description,
                    score: row.matched_attributes as f32 * self.config.attribute_weight,
                    method: METHOD_ATTRIBUTE,
                })
                .collect(),
            Err(e) => {
                tracing::warn!("attribute strategy failed: {e}");
                Vec::new()
            }
        }
    }
}
