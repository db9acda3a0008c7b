//! catsearch-memory - In-memory reference implementations of the store seams
//!
//! These are fixtures for tests and the CLI, not an indexing engine: linear
//! scans over a loaded catalog, plus a deterministic hashing embedder that
//! stands in for a real sentence encoder. Both stores implement the same
//! traits a production graph store or vector database would sit behind.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use catsearch_analyze::{generate_code_variations, is_code_token, levenshtein};
use catsearch_core::{
    AttributeMatch, Embedder, FullTextMatch, LexicalStore, NeighborMatch, ProductRecord, Result,
    TermListMatch, VectorStore,
};

/// Full-text scoring weights: a name hit outranks a description hit, which
/// outranks a precomputed-term hit.
const NAME_HIT: f32 = 2.0;
const DESCRIPTION_HIT: f32 = 1.0;
const TERM_HIT: f32 = 0.5;

/// One indexed product with its lowercased precomputed term set.
struct IndexedProduct {
    record: ProductRecord,
    terms: HashSet<String>,
    name_lower: String,
    description_lower: String,
}

/// In-memory lexical/attribute store.
pub struct MemoryLexicalStore {
    products: Vec<IndexedProduct>,
}

impl MemoryLexicalStore {
    /// Index a catalog, skipping malformed records (empty id or name) and
    /// deriving the search-term list for records that ship without one.
    pub fn new(records: Vec<ProductRecord>) -> Self {
        let mut products = Vec::with_capacity(records.len());
        for mut record in records {
            if record.id.trim().is_empty() || record.name.trim().is_empty() {
                tracing::warn!("skipping malformed product record: {:?}", record.id);
                continue;
            }
            if record.search_terms.is_empty() {
                record.search_terms = derive_search_terms(&record);
            }
            let terms = record
                .search_terms
                .iter()
                .map(|t| t.to_lowercase())
                .collect();
            products.push(IndexedProduct {
                name_lower: record.name.to_lowercase(),
                description_lower: format!(
                    "{} {}",
                    record.short_description.to_lowercase(),
                    record.description.to_lowercase()
                ),
                terms,
                record,
            });
        }
        Self { products }
    }

    /// Access to the indexed records (for the CLI's stats output).
    pub fn records(&self) -> impl Iterator<Item = &ProductRecord> {
        self.products.iter().map(|p| &p.record)
    }
}

#[async_trait]
impl LexicalStore for MemoryLexicalStore {
    async fn count(&self) -> Result<u64> {
        Ok(self.products.len() as u64)
    }

    async fn match_search_terms(
        &self,
        terms: &[String],
        limit: usize,
    ) -> Result<Vec<TermListMatch>> {
        let lowered: BTreeSet<String> = terms.iter().map(|t| t.to_lowercase()).collect();

        let mut rows: Vec<TermListMatch> = self
            .products
            .iter()
            .filter_map(|p| {
                let matched = lowered.iter().filter(|t| p.terms.contains(*t)).count() as u32;
                (matched > 0).then(|| TermListMatch {
                    id: p.record.id.clone(),
                    name: p.record.name.clone(),
                    description: p.record.short_description.clone(),
                    matched_terms: matched,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.matched_terms
                .cmp(&a.matched_terms)
                .then_with(|| a.id.cmp(&b.id))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    async fn full_text(
        &self,
        query: &str,
        fuzzy: bool,
        limit: usize,
    ) -> Result<Vec<FullTextMatch>> {
        let tokens: Vec<String> = catsearch_analyze::split_terms(query)
            .into_iter()
            .filter(|t| t.chars().count() > 1)
            .collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut rows: Vec<FullTextMatch> = self
            .products
            .iter()
            .filter_map(|p| {
                let mut relevance = 0.0;
                for token in &tokens {
                    if p.name_lower.contains(token.as_str()) {
                        relevance += NAME_HIT;
                    } else if p.description_lower.contains(token.as_str()) {
                        relevance += DESCRIPTION_HIT;
                    } else if p.terms.contains(token.as_str()) {
                        relevance += TERM_HIT;
                    } else if fuzzy {
                        if words_of(&p.name_lower).any(|w| tolerant_match(token, w)) {
                            relevance += NAME_HIT * 0.5;
                        } else if words_of(&p.description_lower).any(|w| tolerant_match(token, w))
                        {
                            relevance += DESCRIPTION_HIT * 0.5;
                        }
                    }
                }
                (relevance > 0.0).then(|| FullTextMatch {
                    id: p.record.id.clone(),
                    name: p.record.name.clone(),
                    description: p.record.short_description.clone(),
                    relevance,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    async fn match_attributes(
        &self,
        terms: &[String],
        limit: usize,
    ) -> Result<Vec<AttributeMatch>> {
        let lowered: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();

        let mut rows: Vec<AttributeMatch> = self
            .products
            .iter()
            .filter_map(|p| {
                let matched = p
                    .record
                    .attributes
                    .iter()
                    .filter(|attr| {
                        let key = attr.key.to_lowercase();
                        let value = attr.value.to_lowercase();
                        lowered.iter().any(|term| {
                            key.contains(term.as_str())
                                || value.contains(term.as_str())
                                || term.contains(&key)
                                || term.contains(&value)
                        })
                    })
                    .count() as u32;
                (matched > 0).then(|| AttributeMatch {
                    id: p.record.id.clone(),
                    name: p.record.name.clone(),
                    description: p.record.short_description.clone(),
                    matched_attributes: matched,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.matched_attributes
                .cmp(&a.matched_attributes)
                .then_with(|| a.id.cmp(&b.id))
        });
        rows.truncate(limit);
        Ok(rows)
    }
}

fn words_of(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// Tolerant token match for the fuzzy full-text pass: one edit for medium
/// tokens, two for long ones.
fn tolerant_match(token: &str, word: &str) -> bool {
    let len = token.chars().count();
    if len < 4 {
        return false;
    }
    let budget = if len >= 7 { 2 } else { 1 };
    levenshtein(token, word) <= budget
}

/// Derive the precomputed search-term list for one record: full name, name
/// words, id and embedded code variants, and longer description words.
pub fn derive_search_terms(record: &ProductRecord) -> Vec<String> {
    let mut terms = BTreeSet::new();

    terms.insert(record.name.to_lowercase());
    terms.insert(record.id.to_lowercase());
    for variant in generate_code_variations(&record.id) {
        terms.insert(variant.to_lowercase());
    }

    for word in record.name.split_whitespace() {
        let cleaned = word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-');
        if cleaned.chars().count() > 2 {
            terms.insert(cleaned.to_lowercase());
        }
        if is_code_token(cleaned) {
            for variant in generate_code_variations(cleaned) {
                terms.insert(variant.to_lowercase());
            }
        }
    }

    for word in record.short_description.split_whitespace() {
        let cleaned = word.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        if cleaned.chars().count() > 3 {
            terms.insert(cleaned.to_lowercase());
        }
    }

    terms.into_iter().collect()
}

/// One stored embedding.
struct VectorEntry {
    id: String,
    name: String,
    vector: Vec<f32>,
}

/// In-memory vector similarity store over unit vectors.
pub struct MemoryVectorStore {
    entries: Vec<VectorEntry>,
}

impl MemoryVectorStore {
    /// Embed and index each product's name and short description.
    pub async fn index_products<E>(records: &[ProductRecord], embedder: &E) -> Result<Self>
    where
        E: Embedder + ?Sized,
    {
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            if record.id.trim().is_empty() || record.name.trim().is_empty() {
                continue;
            }
            let text = format!("{} {}", record.name, record.short_description);
            let vector = embedder.embed_query(&text).await?;
            entries.push(VectorEntry {
                id: record.id.clone(),
                name: record.name.clone(),
                vector,
            });
        }
        Ok(Self { entries })
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn count(&self) -> Result<u64> {
        Ok(self.entries.len() as u64)
    }

    async fn nearest(&self, vector: &[f32], limit: usize) -> Result<Vec<NeighborMatch>> {
        let mut neighbors: Vec<NeighborMatch> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let similarity = cosine(vector, &entry.vector).clamp(0.0, 1.0);
                (similarity > 0.0).then(|| NeighborMatch {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                    similarity,
                })
            })
            .collect();

        neighbors.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        neighbors.truncate(limit);
        Ok(neighbors)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Deterministic bag-of-hashed-tokens embedder.
///
/// Each token hashes to a fixed pseudo-random direction; a text embeds to
/// the L2-normalized sum of its token directions, so texts sharing tokens
/// land near each other. A stand-in for a sentence encoder with the same
/// determinism guarantee the engine relies on.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn token_vector(token: &str, dimension: usize) -> Vec<f32> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(token.as_bytes());
        let mut reader = hasher.finalize_xof();
        let mut buf = vec![0u8; dimension * 4];
        reader.fill(&mut buf);

        buf.chunks_exact(4)
            .map(|c| {
                let bits = u32::from_le_bytes([c[0], c[1], c[2], c[3]]);
                bits as f32 / u32::MAX as f32 - 0.5
            })
            .collect()
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let mut tokens = 0usize;

        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            for (v, t) in vector
                .iter_mut()
                .zip(Self::token_vector(token, self.dimension))
            {
                *v += t;
            }
            tokens += 1;
        }

        if tokens > 0 {
            let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for v in &mut vector {
                    *v /= norm;
                }
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Both stores built from one catalog, sharing the same product id space.
pub struct MemoryCatalog {
    pub lexical: Arc<MemoryLexicalStore>,
    pub vector: Arc<MemoryVectorStore>,
}

impl MemoryCatalog {
    /// Index a catalog into both stores.
    pub async fn build<E>(records: Vec<ProductRecord>, embedder: &E) -> Result<Self>
    where
        E: Embedder + ?Sized,
    {
        let vector = MemoryVectorStore::index_products(&records, embedder).await?;
        let lexical = MemoryLexicalStore::new(records);
        Ok(Self {
            lexical: Arc::new(lexical),
            vector: Arc::new(vector),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catsearch_core::Attribute;

    fn record(id: &str, name: &str, short: &str) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name: name.to_string(),
            short_description: short.to_string(),
            description: String::new(),
            attributes: Vec::new(),
            search_terms: Vec::new(),
        }
    }

    #[test]
    fn test_derive_search_terms_includes_code_variants() {
        let terms = derive_search_terms(&record(
            "P-100",
            "CX-112 Coaxial Connector",
            "Gold plated",
        ));

        assert!(terms.contains(&"cx-112".to_string()));
        assert!(terms.contains(&"cx112".to_string()));
        assert!(terms.contains(&"cx 112".to_string()));
        assert!(terms.contains(&"coaxial".to_string()));
        assert!(terms.contains(&"connector".to_string()));
        assert!(terms.contains(&"gold".to_string()));
        assert!(terms.contains(&"cx-112 coaxial connector".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let store = MemoryLexicalStore::new(vec![
            record("", "Nameless", ""),
            record("P-1", "", ""),
            record("P-2", "Valid Product", ""),
        ]);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_match_search_terms_counts_intersection() {
        let store = MemoryLexicalStore::new(vec![
            record("P-1", "Wireless Mouse", "Ergonomic wireless mouse"),
            record("P-2", "Wired Keyboard", "Mechanical keyboard"),
        ]);

        let rows = store
            .match_search_terms(&["wireless".into(), "mouse".into()], 10)
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "P-1");
        assert_eq!(rows[0].matched_terms, 2);
    }

    #[tokio::test]
    async fn test_full_text_name_outranks_description() {
        let store = MemoryLexicalStore::new(vec![
            record("P-1", "Crane Hook", "Steel"),
            record("P-2", "Steel Beam", "For crane assembly"),
        ]);

        let rows = store.full_text("crane", false, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "P-1");
        assert!(rows[0].relevance > rows[1].relevance);
    }

    #[tokio::test]
    async fn test_full_text_fuzzy_tolerates_edits() {
        let store = MemoryLexicalStore::new(vec![record(
            "P-1",
            "Wireless Charger",
            "Fast charging pad",
        )]);

        // "wirelss" is one edit away and only matches in the fuzzy pass
        let strict = store.full_text("wirelss", false, 10).await.unwrap();
        assert!(strict.is_empty());
        let fuzzy = store.full_text("wirelss", true, 10).await.unwrap();
        assert_eq!(fuzzy.len(), 1);
    }

    #[tokio::test]
    async fn test_attribute_bidirectional_containment() {
        let mut r = record("P-1", "Mobile Crane", "");
        r.attributes.push(Attribute::new("capacity", "5 tons"));
        let store = MemoryLexicalStore::new(vec![r]);

        // Term contained in value
        let rows = store.match_attributes(&["tons".into()], 10).await.unwrap();
        assert_eq!(rows.len(), 1);

        // Key contained in term
        let rows = store
            .match_attributes(&["capacity rating".into()], 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].matched_attributes, 1);
    }

    #[tokio::test]
    async fn test_hash_embedder_is_deterministic_and_normalized() {
        let embedder = HashEmbedder::new(32);
        let a = embedder.embed_query("wireless headphones").await.unwrap();
        let b = embedder.embed_query("wireless headphones").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_shared_tokens_raise_similarity() {
        let embedder = HashEmbedder::new(64);
        let query = embedder.embed_query("wireless headphones").await.unwrap();
        let near = embedder
            .embed_query("wireless headphones with noise cancelling")
            .await
            .unwrap();
        let far = embedder.embed_query("garden hose reel").await.unwrap();

        assert!(cosine(&query, &near) > cosine(&query, &far));
    }

    #[tokio::test]
    async fn test_nearest_orders_by_similarity() {
        let embedder = HashEmbedder::new(64);
        let records = vec![
            record("P-1", "Wireless Headphones", "Over-ear"),
            record("P-2", "Garden Hose", "Expandable"),
        ];
        let store = MemoryVectorStore::index_products(&records, &embedder)
            .await
            .unwrap();

        let query = embedder.embed_query("wireless headphones").await.unwrap();
        let neighbors = store.nearest(&query, 10).await.unwrap();

        assert!(!neighbors.is_empty());
        assert_eq!(neighbors[0].id, "P-1");
        for pair in neighbors.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[tokio::test]
    async fn test_catalog_build_shares_id_space() {
        let embedder = HashEmbedder::default();
        let catalog = MemoryCatalog::build(
            vec![record("P-1", "Wireless Headphones", "")],
            &embedder,
        )
        .await
        .unwrap();

        assert_eq!(catalog.lexical.count().await.unwrap(), 1);
        assert_eq!(catalog.vector.count().await.unwrap(), 1);
    }
}
