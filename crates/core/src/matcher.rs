//! Token-overlap symptom matching

use std::collections::HashSet;

use crate::knowledge::SymptomConditionIndex;

/// Maps free text to the symptom keys it mentions
pub trait SymptomMatcher: Send + Sync {
    fn match_symptoms(&self, text: &str, index: &SymptomConditionIndex) -> Vec<String>;
}

/// Common English function words, dropped by the stopword-filtering matcher
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "i", "i'm", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my",
    "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "out",
    "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "you", "your",
];

/// Lowercase and split into word tokens, dropping punctuation
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|token| token.trim_matches('\''))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// A symptom matches when any of its tokens appears verbatim in the input.
///
/// Generic tokens ("of", "pain") produce false positives and paraphrases are
/// missed; that is the accepted behavior of this strategy.
#[derive(Debug, Clone, Default)]
pub struct TokenOverlapMatcher {
    stopwords: Option<HashSet<&'static str>>,
}

impl TokenOverlapMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore common English stopwords on both sides before comparing
    pub fn with_stopwords() -> Self {
        Self {
            stopwords: Some(STOPWORDS.iter().copied().collect()),
        }
    }

    fn tokens(&self, text: &str) -> HashSet<String> {
        tokenize(text)
            .into_iter()
            .filter(|token| match &self.stopwords {
                Some(stopwords) => !stopwords.contains(token.as_str()),
                None => true,
            })
            .collect()
    }
}

impl SymptomMatcher for TokenOverlapMatcher {
    fn match_symptoms(&self, text: &str, index: &SymptomConditionIndex) -> Vec<String> {
        let input = self.tokens(text);
        let matched: Vec<String> = index
            .symptoms()
            .filter(|symptom| {
                self.tokens(symptom)
                    .iter()
                    .any(|token| input.contains(token))
            })
            .map(str::to_string)
            .collect();

        tracing::debug!(matched = ?matched, "Matched symptoms");
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SymptomConditionIndex {
        SymptomConditionIndex::from_pairs([
            ("fever", "Flu"),
            ("headache", "Migraine"),
            ("loss of appetite", "Gastritis"),
            ("sore throat", "Cold"),
        ])
    }

    #[test]
    fn tokenizer_strips_punctuation_and_case() {
        assert_eq!(
            tokenize("Fever, HEADACHE & a sore-throat!"),
            ["fever", "headache", "a", "sore", "throat"]
        );
        assert_eq!(tokenize("I'm 'tired'"), ["i'm", "tired"]);
        assert!(tokenize("  ?! ").is_empty());
    }

    #[test]
    fn matches_known_symptom_tokens() {
        let matcher = TokenOverlapMatcher::new();
        let matched = matcher.match_symptoms("I have a Fever and a headache.", &index());
        assert_eq!(matched, ["fever", "headache"]);
    }

    #[test]
    fn no_overlap_is_empty() {
        let matcher = TokenOverlapMatcher::new();
        assert!(matcher.match_symptoms("feeling great", &index()).is_empty());
        assert!(matcher.match_symptoms("", &index()).is_empty());
    }

    #[test]
    fn partial_phrase_overlap_matches() {
        let matcher = TokenOverlapMatcher::new();
        assert_eq!(
            matcher.match_symptoms("my throat is scratchy", &index()),
            ["sore throat"]
        );
        // Generic words overlap too
        assert_eq!(
            matcher.match_symptoms("out of breath", &index()),
            ["loss of appetite"]
        );
    }

    #[test]
    fn stopword_matcher_ignores_function_words() {
        let matcher = TokenOverlapMatcher::with_stopwords();
        assert!(matcher.match_symptoms("out of breath", &index()).is_empty());
        assert_eq!(
            matcher.match_symptoms("no appetite lately", &index()),
            ["loss of appetite"]
        );
    }
}
