//! Adaptive weighted rank fusion with cross-source and fuzzy bonuses.

use std::cmp::Ordering;
use std::sync::Arc;

use catsearch_analyze::TermNormalizer;
use catsearch_core::{Candidate, FusionConfig, FusionWeights, NeighborMatch};

use crate::lexical;
use crate::normalize::min_max;

/// Provenance tag for the semantic source.
pub const METHOD_SEMANTIC: &str = "semantic";

/// Combines normalized per-source scores into one ranked candidate list.
///
/// Two modes: the exact product-code short-circuit ranks purely by
/// normalized lexical score, while general fusion blends reciprocal rank
/// and normalized score per source, bonuses dual-source candidates, and
/// applies fuzzy post-processing against the raw query.
pub struct FusionEngine {
    config: FusionConfig,
    normalizer: Arc<TermNormalizer>,
}

impl FusionEngine {
    pub fn new(config: FusionConfig, normalizer: Arc<TermNormalizer>) -> Self {
        Self { config, normalizer }
    }

    /// Exact-match mode: rank by normalized lexical score alone. The
    /// semantic source is never consulted for code queries.
    pub fn fuse_code(&self, mut lexical: Vec<Candidate>, limit: usize) -> Vec<Candidate> {
        sort_by_raw_lexical(&mut lexical);

        let norms = min_max(&collect(&lexical, |c| c.lexical_raw));
        for (candidate, norm) in lexical.iter_mut().zip(norms) {
            candidate.lexical_norm = norm;
            candidate.final_score = norm;
        }

        sort_ranked(&mut lexical);
        lexical.truncate(limit);
        lexical
    }

    /// General fusion over both sources.
    pub fn fuse(
        &self,
        query: &str,
        weights: FusionWeights,
        mut lexical: Vec<Candidate>,
        semantic: Vec<NeighborMatch>,
        limit: usize,
    ) -> Vec<Candidate> {
        let cfg = &self.config;

        // Rank the lexical side and fold its contribution
        sort_by_raw_lexical(&mut lexical);
        let lexical_norms = min_max(&collect(&lexical, |c| c.lexical_raw));
        let semantic_norms = min_max(&collect(&semantic, |n| n.similarity));

        let mut combined: Vec<Candidate> = Vec::with_capacity(lexical.len() + semantic.len());
        for (rank0, (mut candidate, norm)) in lexical.into_iter().zip(lexical_norms).enumerate() {
            candidate.lexical_norm = norm;
            candidate.final_score =
                weights.lexical * self.contribution(rank0 + 1, norm);
            combined.push(candidate);
        }

        // Fold the semantic side into the same accumulator
        for (rank0, (neighbor, norm)) in semantic.into_iter().zip(semantic_norms).enumerate() {
            let contribution = weights.semantic * self.contribution(rank0 + 1, norm);
            if let Some(existing) = combined.iter_mut().find(|c| c.id == neighbor.id) {
                existing.semantic_raw = neighbor.similarity;
                existing.semantic_norm = norm;
                existing.methods.insert(METHOD_SEMANTIC);
                existing.final_score += contribution;
                // Present in both sources: apply the cross-source bonus
                existing.final_score *= cfg.cross_source_bonus;
            } else {
                let mut candidate = Candidate::new(neighbor.id, neighbor.name);
                candidate.semantic_raw = neighbor.similarity;
                candidate.semantic_norm = norm;
                candidate.methods.insert(METHOD_SEMANTIC);
                candidate.final_score = contribution;
                combined.push(candidate);
            }
        }

        self.apply_fuzzy_bonuses(query, &mut combined);

        sort_ranked(&mut combined);
        combined.truncate(limit);
        combined
    }

    /// Per-source contribution at a 1-based rank: a compressed reciprocal
    /// rank blended with the normalized score.
    fn contribution(&self, rank: usize, norm: f32) -> f32 {
        let rr = 1.0 / (rank as f32 + self.config.rank_offset);
        self.config.rank_share * rr + self.config.score_share * norm
    }

    /// Post-hoc bonuses computed against the raw query: name similarity
    /// above the threshold, and stop-word-filtered word overlap.
    fn apply_fuzzy_bonuses(&self, query: &str, candidates: &mut [Candidate]) {
        let cfg = &self.config;
        let query_lower = query.to_lowercase();
        let query_words = self.normalizer.content_words(query);

        for candidate in candidates.iter_mut() {
            let name_lower = candidate.name.to_lowercase();

            let similarity = self.normalizer.similarity(&query_lower, &name_lower);
            if similarity > cfg.name_similarity_threshold {
                candidate.fuzzy_bonus = similarity * cfg.name_bonus_weight;
                candidate.final_score += candidate.fuzzy_bonus;
            }

            let name_words = self.normalizer.content_words(&candidate.name);
            if !query_words.is_empty() && !name_words.is_empty() {
                let overlap = query_words.intersection(&name_words).count() as f32
                    / query_words.len() as f32;
                if overlap > 0.0 {
                    candidate.overlap_bonus = overlap * cfg.overlap_bonus_weight;
                    candidate.final_score += candidate.overlap_bonus;
                }
            }
        }
    }
}

fn collect<T>(items: &[T], get: impl Fn(&T) -> f32) -> Vec<f32> {
    items.iter().map(get).collect()
}

/// Deterministic pre-fusion ordering: raw lexical score descending, then
/// product id ascending.
fn sort_by_raw_lexical(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.lexical_raw
            .partial_cmp(&a.lexical_raw)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Final ordering: fused score descending, ties broken by ascending id.
fn sort_ranked(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}
