// file: src/parser/normalizer.rs
// description: plain-text normalization before chunking
// reference: whitespace and line-ending cleanup

use crate::error::Result;

pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, content: &str) -> Result<String> {
        let mut normalized = self.normalize_line_endings(content);

        normalized = self.normalize_lines(&normalized);
        normalized = self.normalize_blank_lines(&normalized);

        Ok(normalized.trim().to_string())
    }

    fn normalize_line_endings(&self, content: &str) -> String {
        content
            .trim_start_matches('\u{feff}')
            .replace("\r\n", "\n")
            .replace('\r', "\n")
    }

    /// Trims each line and collapses runs of inner whitespace.
    fn normalize_lines(&self, content: &str) -> String {
        content
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn normalize_blank_lines(&self, content: &str) -> String {
        let mut result: Vec<&str> = Vec::new();
        let mut previous_blank = false;

        for line in content.lines() {
            let blank = line.is_empty();
            if blank && previous_blank {
                continue;
            }
            result.push(line);
            previous_blank = blank;
        }

        result.join("\n")
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indentation_and_spacing() {
        let normalizer = TextNormalizer::new();
        let content = "A quantum computer  is\ta computer.\n        At small scales, matter   behaves oddly.   ";
        let normalized = normalizer.normalize(content).unwrap();

        assert_eq!(
            normalized,
            "A quantum computer is a computer.\nAt small scales, matter behaves oddly."
        );
    }

    #[test]
    fn test_line_endings_and_bom() {
        let normalizer = TextNormalizer::new();
        let normalized = normalizer.normalize("\u{feff}Line 1\r\nLine 2\rLine 3").unwrap();
        assert_eq!(normalized, "Line 1\nLine 2\nLine 3");
    }

    #[test]
    fn test_blank_line_collapsing() {
        let normalizer = TextNormalizer::new();
        let normalized = normalizer.normalize("Para 1\n\n\n   \nPara 2\n\n").unwrap();

        assert_eq!(normalized, "Para 1\n\nPara 2");
    }
}
