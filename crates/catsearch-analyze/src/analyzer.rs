//! Query intent classification and fusion weight selection.

use std::collections::BTreeSet;

use catsearch_core::{FusionWeights, WeightConfig};

use crate::terms::split_terms;

/// Keywords that mark a query as attribute-like.
const ATTRIBUTE_KEYWORDS: &[&str] = &["with", "having", "type", "category"];

/// What the analyzer learned about one query.
#[derive(Debug, Clone, Default)]
pub struct QueryAnalysis {
    /// True when the query contains a product-code token.
    pub has_product_code: bool,

    /// Detected code tokens (uppercased), in query order.
    pub code_patterns: Vec<String>,

    /// Three tokens or fewer.
    pub is_short: bool,

    /// More than five tokens.
    pub is_descriptive: bool,

    /// Contains `:`/`=` or an attribute keyword.
    pub has_attributes: bool,

    /// Lowercased content tokens of the query.
    pub normalized_terms: BTreeSet<String>,
}

/// Classifies queries and derives per-query fusion weights.
///
/// Detection is priority-ordered: product code beats descriptive beats
/// attribute-like beats the balanced default.
pub struct QueryAnalyzer {
    weights: WeightConfig,
}

impl QueryAnalyzer {
    pub fn new(weights: WeightConfig) -> Self {
        Self { weights }
    }

    /// Analyze a trimmed, non-empty query.
    pub fn analyze(&self, query: &str) -> QueryAnalysis {
        let trimmed = query.trim();
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();

        let mut code_patterns = Vec::new();
        for token in &tokens {
            let cleaned = clean_code_token(token);
            if is_hyphenated_code(cleaned) || is_mixed_alnum_code(cleaned) {
                code_patterns.push(cleaned.to_uppercase());
            }
        }

        let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        let has_attributes = trimmed.contains(':')
            || trimmed.contains('=')
            || lowered
                .iter()
                .any(|t| ATTRIBUTE_KEYWORDS.contains(&t.as_str()));

        let mut normalized_terms: BTreeSet<String> = split_terms(trimmed)
            .into_iter()
            .filter(|t| t.chars().count() > 1)
            .collect();
        normalized_terms.insert(trimmed.to_lowercase());

        QueryAnalysis {
            has_product_code: !code_patterns.is_empty(),
            code_patterns,
            is_short: tokens.len() <= 3,
            is_descriptive: tokens.len() > 5,
            has_attributes,
            normalized_terms,
        }
    }

    /// Fusion weights for an analyzed query, first matching rule wins.
    pub fn weights_for(&self, analysis: &QueryAnalysis) -> FusionWeights {
        if analysis.has_product_code {
            self.weights.product_code
        } else if analysis.is_descriptive {
            self.weights.descriptive
        } else if analysis.has_attributes {
            self.weights.attribute
        } else {
            self.weights.balanced
        }
    }
}

/// Does a single token look like a product code? Used both during query
/// analysis and when deriving per-product search terms.
pub fn is_code_token(token: &str) -> bool {
    let cleaned = clean_code_token(token);
    is_hyphenated_code(cleaned) || is_mixed_alnum_code(cleaned)
}

/// Strip punctuation that commonly wraps a code token in prose, keeping
/// interior hyphens.
fn clean_code_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_ascii_alphanumeric())
}

/// A hyphen-joined run of alphanumeric groups, e.g. `AIUR-06-102J`.
fn is_hyphenated_code(token: &str) -> bool {
    let upper = token.to_uppercase();
    let groups: Vec<&str> = upper.split('-').collect();
    groups.len() >= 2
        && groups
            .iter()
            .all(|g| !g.is_empty() && g.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// A single alphanumeric token of four or more characters mixing letters
/// and digits, e.g. `CX112`.
fn is_mixed_alnum_code(token: &str) -> bool {
    let upper = token.to_uppercase();
    upper.chars().count() >= 4
        && upper.chars().all(|c| c.is_ascii_alphanumeric())
        && upper.chars().any(|c| c.is_ascii_alphabetic())
        && upper.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> QueryAnalyzer {
        QueryAnalyzer::new(WeightConfig::default())
    }

    #[test]
    fn test_detects_hyphenated_codes() {
        let analysis = analyzer().analyze("CX-112");
        assert!(analysis.has_product_code);
        assert_eq!(analysis.code_patterns, vec!["CX-112"]);

        let analysis = analyzer().analyze("AIUR-06-102J");
        assert!(analysis.has_product_code);
        assert_eq!(analysis.code_patterns, vec!["AIUR-06-102J"]);
    }

    #[test]
    fn test_detects_mixed_alnum_codes() {
        let analysis = analyzer().analyze("cx112");
        assert!(analysis.has_product_code);
        assert_eq!(analysis.code_patterns, vec!["CX112"]);
    }

    #[test]
    fn test_plain_words_are_not_codes() {
        assert!(!analyzer().analyze("wireless headphones").has_product_code);
        assert!(!analyzer().analyze("crane").has_product_code);
        // Three letters + no digit, and too short respectively
        assert!(!analyzer().analyze("usb").has_product_code);
        assert!(!analyzer().analyze("4k").has_product_code);
    }

    #[test]
    fn test_code_embedded_in_prose() {
        let analysis = analyzer().analyze("connector for CX-112, urgent");
        assert!(analysis.has_product_code);
        assert_eq!(analysis.code_patterns, vec!["CX-112"]);
    }

    #[test]
    fn test_weight_selection_per_class() {
        let analyzer = analyzer();

        let code = analyzer.analyze("AIUR-06-102J");
        assert_eq!(analyzer.weights_for(&code), FusionWeights::new(0.8, 0.2));

        let descriptive =
            analyzer.analyze("sturdy outdoor speaker stand made from brushed aluminum");
        assert!(descriptive.is_descriptive);
        assert_eq!(
            analyzer.weights_for(&descriptive),
            FusionWeights::new(0.3, 0.7)
        );

        let attribute = analyzer.analyze("capacity: 5 tons");
        assert!(attribute.has_attributes);
        assert_eq!(
            analyzer.weights_for(&attribute),
            FusionWeights::new(0.7, 0.3)
        );

        let balanced = analyzer.analyze("crane");
        assert_eq!(
            analyzer.weights_for(&balanced),
            FusionWeights::new(0.5, 0.5)
        );
    }

    #[test]
    fn test_code_beats_descriptive() {
        // Priority order: a code anywhere wins even in a long query
        let analyzer = analyzer();
        let analysis = analyzer.analyze("looking for a spare AIUR-06-102J inductor for my board");
        assert!(analysis.has_product_code);
        assert!(analysis.is_descriptive);
        assert_eq!(analyzer.weights_for(&analysis), FusionWeights::new(0.8, 0.2));
    }

    #[test]
    fn test_attribute_markers() {
        assert!(analyzer().analyze("voltage=12").has_attributes);
        assert!(analyzer().analyze("drill with hammer action").has_attributes);
        assert!(analyzer().analyze("category lighting").has_attributes);
        assert!(!analyzer().analyze("red hammer").has_attributes);
    }

    #[test]
    fn test_short_flag() {
        assert!(analyzer().analyze("red hammer").is_short);
        assert!(!analyzer().analyze("red hammer with a fiberglass handle").is_short);
    }

    #[test]
    fn test_normalized_terms() {
        let analysis = analyzer().analyze("Wireless Headphones");
        assert!(analysis.normalized_terms.contains("wireless"));
        assert!(analysis.normalized_terms.contains("headphones"));
        assert!(analysis.normalized_terms.contains("wireless headphones"));
    }
}
