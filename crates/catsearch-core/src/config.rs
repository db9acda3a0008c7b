//! Configuration types for the catalog search engine.
//!
//! Every empirically chosen scoring constant lives here as a configurable
//! default rather than a literal in the ranking code. None of these values
//! has been calibrated against a labeled relevance set; treat them as
//! starting points.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::FusionWeights;

/// Main tuning configuration for the search engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchTuning {
    /// Per-query-class fusion weights.
    #[serde(default)]
    pub weights: WeightConfig,

    /// Lexical sub-strategy score weights.
    #[serde(default)]
    pub lexical: LexicalConfig,

    /// Fusion and post-processing constants.
    #[serde(default)]
    pub fusion: FusionConfig,

    /// Result-count bounds and deadlines.
    #[serde(default)]
    pub limits: LimitConfig,

    /// Text-matching capability selection.
    #[serde(default)]
    pub matcher: MatcherConfig,
}

/// Fusion weights per detected query class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightConfig {
    /// Product-code queries: heavily favor exact lexical matching.
    #[serde(default = "default_product_code_weights")]
    pub product_code: FusionWeights,

    /// Long descriptive queries: favor semantic similarity.
    #[serde(default = "default_descriptive_weights")]
    pub descriptive: FusionWeights,

    /// Attribute-like queries: favor the graph side.
    #[serde(default = "default_attribute_weights")]
    pub attribute: FusionWeights,

    /// Everything else.
    #[serde(default = "default_balanced_weights")]
    pub balanced: FusionWeights,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            product_code: default_product_code_weights(),
            descriptive: default_descriptive_weights(),
            attribute: default_attribute_weights(),
            balanced: default_balanced_weights(),
        }
    }
}

/// Score weights for the three lexical sub-strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalConfig {
    /// Multiplier for exact term-list intersection counts.
    #[serde(default = "default_term_weight")]
    pub term_weight: f32,

    /// Multiplier for exact product-code matches (replaces `term_weight`
    /// on code queries).
    #[serde(default = "default_code_weight")]
    pub code_weight: f32,

    /// Multiplier for store-provided full-text relevance.
    #[serde(default = "default_fulltext_weight")]
    pub fulltext_weight: f32,

    /// Multiplier for distinct-attribute match counts.
    #[serde(default = "default_attribute_match_weight")]
    pub attribute_weight: f32,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            term_weight: default_term_weight(),
            code_weight: default_code_weight(),
            fulltext_weight: default_fulltext_weight(),
            attribute_weight: default_attribute_match_weight(),
        }
    }
}

/// Rank-fusion and post-processing constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Offset added to 1-based ranks in the reciprocal-rank term; compresses
    /// the curve so the top rank does not dominate.
    #[serde(default = "default_rank_offset")]
    pub rank_offset: f32,

    /// Share of a source contribution taken from reciprocal rank.
    #[serde(default = "default_rank_share")]
    pub rank_share: f32,

    /// Share of a source contribution taken from the normalized score.
    #[serde(default = "default_score_share")]
    pub score_share: f32,

    /// Multiplier applied to candidates present in both sources.
    #[serde(default = "default_cross_source_bonus")]
    pub cross_source_bonus: f32,

    /// Minimum query/name similarity before the fuzzy bonus applies.
    #[serde(default = "default_name_similarity_threshold")]
    pub name_similarity_threshold: f32,

    /// Coefficient on the name-similarity bonus.
    #[serde(default = "default_name_bonus_weight")]
    pub name_bonus_weight: f32,

    /// Coefficient on the word-overlap bonus.
    #[serde(default = "default_overlap_bonus_weight")]
    pub overlap_bonus_weight: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            rank_offset: default_rank_offset(),
            rank_share: default_rank_share(),
            score_share: default_score_share(),
            cross_source_bonus: default_cross_source_bonus(),
            name_similarity_threshold: default_name_similarity_threshold(),
            name_bonus_weight: default_name_bonus_weight(),
            overlap_bonus_weight: default_overlap_bonus_weight(),
        }
    }
}

/// Result-count bounds and retrieval deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Default number of results returned by `search()`.
    #[serde(default = "default_result_limit")]
    pub default_limit: usize,

    /// Results returned in general (fuzzy) fusion mode.
    #[serde(default = "default_fuzzy_limit")]
    pub fuzzy_limit: usize,

    /// Results returned by the exact product-code short-circuit.
    #[serde(default = "default_code_limit")]
    pub code_limit: usize,

    /// Candidates requested from each source before fusion.
    #[serde(default = "default_candidate_pool")]
    pub candidate_pool: usize,

    /// Per-retriever deadline; an elapsed deadline counts as a retriever
    /// failure, not a fatal error.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            default_limit: default_result_limit(),
            fuzzy_limit: default_fuzzy_limit(),
            code_limit: default_code_limit(),
            candidate_pool: default_candidate_pool(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Which text-matching capability to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    /// Jaro-Winkler similarity with Soundex phonetic codes.
    Enhanced,

    /// Normalized edit distance with a consonant-skeleton phonetic code.
    Basic,
}

/// Text-matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Capability implementation, fixed at construction.
    #[serde(default = "default_matcher_kind")]
    pub kind: MatcherKind,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            kind: default_matcher_kind(),
        }
    }
}

// Default value functions

fn default_product_code_weights() -> FusionWeights {
    FusionWeights::new(0.8, 0.2)
}

fn default_descriptive_weights() -> FusionWeights {
    FusionWeights::new(0.3, 0.7)
}

fn default_attribute_weights() -> FusionWeights {
    FusionWeights::new(0.7, 0.3)
}

fn default_balanced_weights() -> FusionWeights {
    FusionWeights::new(0.5, 0.5)
}

fn default_term_weight() -> f32 {
    3.0
}

fn default_code_weight() -> f32 {
    5.0
}

fn default_fulltext_weight() -> f32 {
    2.0
}

fn default_attribute_match_weight() -> f32 {
    1.3
}

fn default_rank_offset() -> f32 {
    10.0
}

fn default_rank_share() -> f32 {
    0.7
}

fn default_score_share() -> f32 {
    0.3
}

fn default_cross_source_bonus() -> f32 {
    1.2
}

fn default_name_similarity_threshold() -> f32 {
    0.6
}

fn default_name_bonus_weight() -> f32 {
    0.3
}

fn default_overlap_bonus_weight() -> f32 {
    0.2
}

fn default_result_limit() -> usize {
    10
}

fn default_fuzzy_limit() -> usize {
    15
}

fn default_code_limit() -> usize {
    15
}

fn default_candidate_pool() -> usize {
    25
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_matcher_kind() -> MatcherKind {
    MatcherKind::Enhanced
}

impl SearchTuning {
    /// Load tuning from a TOML file.
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let tuning: Self = toml::from_str(&content).map_err(|e| {
            crate::error::SearchError::Config {
                message: format!("Failed to parse config: {}", e),
            }
        })?;
        Ok(tuning)
    }

    /// Load tuning from default paths, falling back to built-in defaults.
    pub fn load_default() -> crate::error::Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("catsearch").join("tuning.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("catsearch.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_tuning() {
        let tuning = SearchTuning::default();
        assert_eq!(tuning.limits.default_limit, 10);
        assert_eq!(tuning.limits.code_limit, 15);
        assert_eq!(tuning.lexical.term_weight, 3.0);
        assert_eq!(tuning.lexical.code_weight, 5.0);
        assert_eq!(tuning.fusion.cross_source_bonus, 1.2);
        assert_eq!(tuning.matcher.kind, MatcherKind::Enhanced);
    }

    #[test]
    fn test_class_weights() {
        let weights = WeightConfig::default();
        assert_eq!(weights.product_code, FusionWeights::new(0.8, 0.2));
        assert_eq!(weights.descriptive, FusionWeights::new(0.3, 0.7));
        assert_eq!(weights.attribute, FusionWeights::new(0.7, 0.3));
        assert_eq!(weights.balanced, FusionWeights::new(0.5, 0.5));
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[limits]\ndefault_limit = 20\n\n[matcher]\nkind = \"basic\"\n"
        )
        .unwrap();

        let tuning = SearchTuning::load(file.path()).unwrap();
        assert_eq!(tuning.limits.default_limit, 20);
        assert_eq!(tuning.matcher.kind, MatcherKind::Basic);
        // Unspecified sections keep their defaults
        assert_eq!(tuning.fusion.rank_offset, 10.0);
        assert_eq!(tuning.lexical.fulltext_weight, 2.0);
    }
}
