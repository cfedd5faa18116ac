// file: src/parser/chunker.rs
// description: paragraph and sentence aware chunking of normalized text
// reference: word-budgeted chunk packing

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutType {
    SentenceEnd,
    ParagraphEnd,
    DocumentEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub word_count: usize,
    pub cut_type: CutType,
}

pub struct TextChunker {
    max_chunk_words: usize,
}

impl TextChunker {
    pub fn new(max_chunk_words: usize) -> Self {
        Self {
            max_chunk_words: max_chunk_words.max(1),
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let mut units: Vec<(String, bool)> = Vec::new();
        for paragraph in paragraphs(text) {
            let sentences = split_sentences(&paragraph);
            let last = sentences.len().saturating_sub(1);
            for (i, sentence) in sentences.into_iter().enumerate() {
                units.push((sentence, i == last));
            }
        }

        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_words = 0;
        let mut last_was_paragraph_end = false;

        for (sentence, paragraph_end) in units {
            let words = word_count(&sentence);
            if !current.is_empty() && current_words + words > self.max_chunk_words {
                let cut_type = if last_was_paragraph_end {
                    CutType::ParagraphEnd
                } else {
                    CutType::SentenceEnd
                };
                chunks.push(self.build_chunk(chunks.len(), &current, current_words, cut_type));
                current.clear();
                current_words = 0;
            }

            current.push(sentence);
            current_words += words;
            last_was_paragraph_end = paragraph_end;
        }

        if !current.is_empty() {
            chunks.push(self.build_chunk(
                chunks.len(),
                &current,
                current_words,
                CutType::DocumentEnd,
            ));
        }

        chunks
    }

    fn build_chunk(
        &self,
        index: usize,
        sentences: &[String],
        word_count: usize,
        cut_type: CutType,
    ) -> Chunk {
        Chunk {
            index,
            text: sentences.join(" "),
            word_count,
            cut_type,
        }
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Paragraphs are separated by blank lines; single line breaks are folded into spaces.
fn paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .collect()
}

/// Splits after `.`, `!` or `?` when followed by whitespace and a capital, digit or quote.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;

    for i in 0..chars.len() {
        let c = chars[i].1;
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && matches!(chars[j].1, '"' | '\'' | ')' | '”') {
            j += 1;
        }
        let end = chars.get(j).map(|(p, _)| *p).unwrap_or(text.len());

        let Some(&(_, next)) = chars.get(j) else {
            continue;
        };
        if !next.is_whitespace() {
            continue;
        }

        let following = chars[j..].iter().map(|(_, c)| *c).find(|c| !c.is_whitespace());
        let starts_new = match following {
            Some(f) => f.is_uppercase() || f.is_ascii_digit() || matches!(f, '"' | '“' | '('),
            None => true,
        };

        if starts_new {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences(
            "A qubit is a unit. It can be in superposition! Is it useful? e.g. maybe.",
        );
        assert_eq!(
            sentences,
            vec![
                "A qubit is a unit.",
                "It can be in superposition!",
                "Is it useful? e.g. maybe.",
            ]
        );
    }

    #[test]
    fn test_split_keeps_closing_quotes() {
        let sentences = split_sentences("He said \"stop.\" Then he left.");
        assert_eq!(sentences, vec!["He said \"stop.\"", "Then he left."]);
    }

    #[test]
    fn test_chunks_respect_word_budget() {
        let text = "One two three four. Five six seven eight. Nine ten eleven twelve.";
        let chunks = TextChunker::new(8).chunk(text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "One two three four. Five six seven eight.");
        assert_eq!(chunks[0].word_count, 8);
        assert_eq!(chunks[0].cut_type, CutType::SentenceEnd);
        assert_eq!(chunks[1].cut_type, CutType::DocumentEnd);
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn test_paragraph_cut_type() {
        let text = "First paragraph sentence here.\n\nSecond paragraph sentence here.";
        let chunks = TextChunker::new(5).chunk(text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].cut_type, CutType::ParagraphEnd);
    }

    #[test]
    fn test_oversized_sentence_is_its_own_chunk() {
        let chunks = TextChunker::new(2).chunk("This sentence is far too long.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].word_count, 6);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(TextChunker::new(10).chunk("  \n\n ").is_empty());
    }
}
