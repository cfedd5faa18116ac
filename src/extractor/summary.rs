// file: src/extractor/summary.rs
// description: extractive summaries ranked by normalised term frequency
// reference: frequency-based sentence scoring

use crate::extractor::patterns::content_tokens;
use crate::parser::split_sentences;
use std::collections::HashMap;

pub struct Summarizer {
    max_sentences: usize,
}

impl Summarizer {
    pub fn new(max_sentences: usize) -> Self {
        Self {
            max_sentences: max_sentences.max(1),
        }
    }

    /// Picks the highest scoring sentences and returns them in their original order.
    pub fn summarize(&self, text: &str) -> String {
        let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let sentences = split_sentences(&flattened);
        if sentences.len() <= self.max_sentences {
            return sentences.join(" ");
        }

        let frequencies = term_frequencies(&flattened);
        let peak = frequencies.values().copied().max().unwrap_or(1) as f32;

        let mut scored: Vec<(usize, f32)> = sentences
            .iter()
            .enumerate()
            .map(|(i, sentence)| {
                let tokens = content_tokens(sentence);
                if tokens.is_empty() {
                    return (i, 0.0);
                }
                let total: f32 = tokens
                    .iter()
                    .map(|t| frequencies.get(t).copied().unwrap_or(0) as f32 / peak)
                    .sum();
                (i, total / tokens.len() as f32)
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut picked: Vec<usize> = scored
            .into_iter()
            .take(self.max_sentences)
            .map(|(i, _)| i)
            .collect();
        picked.sort_unstable();

        picked
            .into_iter()
            .map(|i| sentences[i].as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn term_frequencies(text: &str) -> HashMap<String, usize> {
    let mut frequencies = HashMap::new();
    for token in content_tokens(text) {
        *frequencies.entry(token).or_insert(0) += 1;
    }
    frequencies
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_text_is_returned_whole() {
        let summarizer = Summarizer::new(2);
        assert_eq!(summarizer.summarize("One idea.  Two ideas."), "One idea. Two ideas.");
    }

    #[test]
    fn test_keeps_original_order() {
        let text = "Qubits store quantum states. The weather was pleasant. \
                    Quantum states of qubits interfere. Lunch was served.";
        let summary = Summarizer::new(2).summarize(text);

        assert_eq!(
            summary,
            "Qubits store quantum states. Quantum states of qubits interfere."
        );
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(Summarizer::new(3).summarize(""), "");
    }
}
