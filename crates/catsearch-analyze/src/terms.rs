//! Fuzzy term normalization: corrected, stemmed, phonetic, and partial
//! variants of query tokens, plus exact product-code variant generation.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::analyzer::QueryAnalysis;
use crate::text::TextMatcher;

/// Stop words dropped during tokenization.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "the", "to", "of", "in", "is",
    "it", "on", "that", "this", "with", "or", "but", "not", "can", "will", "has", "have", "had",
    "was", "were",
];

/// Common catalog-domain misspellings. Correction is an exact lookup; the
/// key must match the token exactly.
const MISSPELLINGS: &[(&str, &str)] = &[
    ("labtop", "laptop"),
    ("laptpo", "laptop"),
    ("laptp", "laptop"),
    ("wireles", "wireless"),
    ("wirless", "wireless"),
    ("wirelss", "wireless"),
    ("computor", "computer"),
    ("compter", "computer"),
    ("computr", "computer"),
    ("keboard", "keyboard"),
    ("keybaord", "keyboard"),
    ("keybord", "keyboard"),
    ("accesory", "accessory"),
    ("accessry", "accessory"),
    ("accesorry", "accessory"),
    ("conector", "connector"),
    ("connectr", "connector"),
    ("connctor", "connector"),
    ("reciver", "receiver"),
    ("reciever", "receiver"),
    ("recever", "receiver"),
    ("transmiter", "transmitter"),
    ("elecric", "electric"),
    ("elctric", "electric"),
    ("electirc", "electric"),
    ("baterry", "battery"),
    ("batery", "battery"),
    ("battry", "battery"),
    ("chargr", "charger"),
    ("chager", "charger"),
    ("adaptr", "adapter"),
    ("adaptor", "adapter"),
    ("adpater", "adapter"),
    ("cabl", "cable"),
    ("cabel", "cable"),
    ("calbe", "cable"),
    ("devic", "device"),
    ("deivce", "device"),
    ("divice", "device"),
    ("netwrk", "network"),
    ("netowrk", "network"),
    ("netowork", "network"),
    ("memorry", "memory"),
    ("memroy", "memory"),
    ("memeory", "memory"),
    ("storag", "storage"),
    ("storeage", "storage"),
    ("storge", "storage"),
];

/// Disjoint term categories derived from one query.
///
/// `product_codes` is kept apart from every fuzzy category: codes are
/// matched exactly, never stemmed or phonetically encoded, so a model
/// number cannot collide with a look-alike word.
#[derive(Debug, Clone, Default)]
pub struct TermSet {
    /// Query and surviving tokens as typed (lowercased).
    pub original: BTreeSet<String>,

    /// Misspelling-dictionary corrections.
    pub corrected: BTreeSet<String>,

    /// Suffix-stripped stems of tokens and corrections.
    pub stemmed: BTreeSet<String>,

    /// Four-character phonetic codes.
    pub phonetic: BTreeSet<String>,

    /// Prefix/suffix/middle fragments of longer tokens.
    pub partial: BTreeSet<String>,

    /// Exact product-code variants; excluded from `all_terms`.
    pub product_codes: BTreeSet<String>,
}

impl TermSet {
    /// Union of every fuzzy category. Product codes are deliberately
    /// excluded; they only participate in exact matching.
    pub fn all_terms(&self) -> BTreeSet<String> {
        let mut all = BTreeSet::new();
        all.extend(self.original.iter().cloned());
        all.extend(self.corrected.iter().cloned());
        all.extend(self.stemmed.iter().cloned());
        all.extend(self.phonetic.iter().cloned());
        all.extend(self.partial.iter().cloned());
        all
    }

    /// True when the query was treated as a product-code query.
    pub fn is_code_query(&self) -> bool {
        !self.product_codes.is_empty()
    }
}

/// Expands a query into exact code variants or a fuzzy term set.
pub struct TermNormalizer {
    matcher: Arc<dyn TextMatcher>,
    stop_words: BTreeSet<&'static str>,
    misspellings: HashMap<&'static str, &'static str>,
}

impl TermNormalizer {
    pub fn new(matcher: Arc<dyn TextMatcher>) -> Self {
        Self {
            matcher,
            stop_words: STOP_WORDS.iter().copied().collect(),
            misspellings: MISSPELLINGS.iter().copied().collect(),
        }
    }

    /// Normalize a query according to its analysis.
    ///
    /// Code queries get exact variant closure only; fuzzy processing is
    /// skipped entirely for them. Everything else gets the full corrected/
    /// stemmed/phonetic/partial expansion.
    pub fn normalize(&self, query: &str, analysis: &QueryAnalysis) -> TermSet {
        let mut terms = TermSet::default();
        let trimmed = query.trim();

        if analysis.has_product_code {
            for code in &analysis.code_patterns {
                terms.product_codes.extend(generate_code_variations(code));
            }
            tracing::debug!(
                codes = terms.product_codes.len(),
                "code query: fuzzy expansion skipped"
            );
            return terms;
        }

        terms.original.insert(trimmed.to_lowercase());

        for word in split_terms(trimmed) {
            if word.chars().count() <= 1 || self.stop_words.contains(word.as_str()) {
                continue;
            }

            terms.original.insert(word.clone());

            if let Some(&corrected) = self.misspellings.get(word.as_str()) {
                terms.corrected.insert(corrected.to_string());
                terms.stemmed.insert(self.matcher.stem(corrected));
            }

            terms.stemmed.insert(self.matcher.stem(&word));
            terms.phonetic.insert(self.matcher.phonetic_code(&word));

            let chars: Vec<char> = word.chars().collect();
            if chars.len() > 4 {
                terms.partial.insert(chars[..3].iter().collect());
                terms.partial.insert(chars[chars.len() - 3..].iter().collect());
            }
            if chars.len() > 6 {
                terms.partial.insert(chars[..4].iter().collect());
                terms.partial.insert(chars[chars.len() - 4..].iter().collect());
                terms
                    .partial
                    .insert(chars[1..chars.len() - 1].iter().collect());
            }
        }

        terms
    }

    /// Fuzzy similarity between two strings (see [`TextMatcher::similarity`]).
    pub fn similarity(&self, a: &str, b: &str) -> f32 {
        self.matcher.similarity(a, b)
    }

    /// Lowercased, stop-word-filtered content words of a text.
    pub fn content_words(&self, text: &str) -> BTreeSet<String> {
        split_terms(text)
            .into_iter()
            .filter(|w| w.chars().count() > 1 && !self.stop_words.contains(w.as_str()))
            .collect()
    }
}

/// Split on whitespace and punctuation, lowercasing each piece.
pub fn split_terms(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| {
            c.is_whitespace() || matches!(c, '-' | '_' | ',' | ';' | ':' | '.' | '(' | ')')
        })
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Generate the exact-match variant closure of a product code: every case
/// form crossed with every separator form, plus two positional-case
/// variants. Character confusions (O vs 0) are not generated.
pub fn generate_code_variations(code: &str) -> BTreeSet<String> {
    let code = code.trim();
    let mut variations = BTreeSet::new();

    for separator in ["-", "", " ", "_", "."] {
        let replaced = code.replace('-', separator);
        variations.insert(replaced.to_uppercase());
        variations.insert(replaced.to_lowercase());
        variations.insert(replaced);
    }

    let parts: Vec<&str> = code.split('-').collect();
    if parts.len() >= 2 {
        // First segment upper, rest lower
        let mut mixed = vec![parts[0].to_uppercase()];
        mixed.extend(parts[1..].iter().map(|p| p.to_lowercase()));
        variations.insert(mixed.join("-"));

        // Alternating case by segment
        let alternating: Vec<String> = parts
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i % 2 == 0 {
                    p.to_uppercase()
                } else {
                    p.to_lowercase()
                }
            })
            .collect();
        variations.insert(alternating.join("-"));
    }

    variations
}
