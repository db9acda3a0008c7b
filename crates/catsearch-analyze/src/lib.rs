//! catsearch-analyze - Query analysis and term normalization
//!
//! This crate classifies query intent, derives per-query fusion weights,
//! and expands queries into exact code variants or fuzzy term sets
//! (corrected, stemmed, phonetic, partial).
//!
//! # Example
//!
//! ```rust
//! use catsearch_analyze::{QueryAnalyzer, TermNormalizer, build_matcher};
//! use catsearch_core::{MatcherKind, WeightConfig};
//!
//! let analyzer = QueryAnalyzer::new(WeightConfig::default());
//! let analysis = analyzer.analyze("CX-112");
//! assert!(analysis.has_product_code);
//!
//! let normalizer = TermNormalizer::new(build_matcher(MatcherKind::Enhanced));
//! let terms = normalizer.normalize("CX-112", &analysis);
//! assert!(terms.product_codes.contains("cx112"));
//! ```

mod analyzer;
mod terms;
mod text;

pub use analyzer::{is_code_token, QueryAnalysis, QueryAnalyzer};
pub use terms::{generate_code_variations, split_terms, TermNormalizer, TermSet};
pub use text::{build_matcher, levenshtein, BasicMatcher, EnhancedMatcher, TextMatcher};
