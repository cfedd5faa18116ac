// file: src/extractor/patterns.rs
// description: compiled regex patterns and stop words for entity extraction
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    // Definitions: "A quantum computer is a computer that ..."
    pub static ref DEFINITION: Regex = Regex::new(
        r"(?i)^(?:(?:a|an|the)\s+)?(?P<subject>[a-z0-9][\w\s-]*?)\s+(?:is|are|was|were)\s+(?:a|an)\s+(?P<rest>.+)$"
    ).expect("DEFINITION regex is valid");

    // Runs of capitalised words: "Natural Language Processing", "Qiskit"
    pub static ref CAPITALIZED_PHRASE: Regex = Regex::new(
        r"\b[A-Z][A-Za-z0-9-]*(?:\s+[A-Z][A-Za-z0-9-]*)*\b"
    ).expect("CAPITALIZED_PHRASE regex is valid");

    pub static ref WORD: Regex = Regex::new(
        r"[A-Za-z][A-Za-z0-9-]*"
    ).expect("WORD regex is valid");

    pub static ref STOPWORDS: HashSet<&'static str> = [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down",
        "during", "each", "either", "even", "every", "few", "for", "from", "further", "had",
        "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how", "however",
        "i", "if", "in", "into", "is", "it", "its", "itself", "just", "less", "like", "many",
        "may", "me", "might", "more", "most", "much", "must", "my", "no", "nor", "not", "now",
        "of", "off", "often", "on", "once", "one", "only", "or", "other", "our", "out", "over",
        "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
        "them", "then", "there", "these", "they", "this", "those", "through", "thus", "to",
        "too", "under", "until", "up", "upon", "us", "use", "used", "using", "very", "was",
        "we", "well", "were", "what", "when", "where", "whether", "which", "while", "who",
        "whom", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
    ]
    .into_iter()
    .collect();
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word.to_lowercase().as_str())
}

/// Lowercased word tokens of `text`.
pub fn tokens(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Lowercased tokens that carry meaning: no stop words, at least three characters.
pub fn content_tokens(text: &str) -> Vec<String> {
    tokens(text)
        .into_iter()
        .filter(|t| t.len() >= 3 && !STOPWORDS.contains(t.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_pattern() {
        let caps = DEFINITION
            .captures("A quantum computer is a computer that exploits quantum phenomena.")
            .unwrap();
        assert_eq!(&caps["subject"], "quantum computer");
        assert!(caps["rest"].starts_with("computer that"));
    }

    #[test]
    fn test_definition_requires_article() {
        assert!(DEFINITION.captures("The system is slow.").is_none());
    }

    #[test]
    fn test_capitalized_phrase_pattern() {
        let found: Vec<&str> = CAPITALIZED_PHRASE
            .find_iter("Work in Natural Language Processing uses Python daily.")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["Work", "Natural Language Processing", "Python"]);
    }

    #[test]
    fn test_content_tokens_skip_stopwords() {
        assert_eq!(
            content_tokens("The qubit is in a superposition of states"),
            vec!["qubit", "superposition", "states"]
        );
        assert!(is_stopword("The"));
    }
}
