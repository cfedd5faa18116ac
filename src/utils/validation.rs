// file: src/utils/validation.rs
// description: input validation for datasets, content and paths
// reference: input validation patterns

use crate::error::{MemoryError, Result};
use std::fs;
use std::path::Path;

const MAX_DATASET_NAME_LEN: usize = 128;
const MAX_TOP_K: usize = 1000;

pub struct Validator;

impl Validator {
    /// Dataset names become storage keys, so separators and dots are rejected.
    pub fn validate_dataset_name(name: &str) -> Result<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(MemoryError::Validation(
                "Dataset name cannot be empty".to_string(),
            ));
        }

        if trimmed.contains(['/', '\\', '.']) {
            return Err(MemoryError::Validation(format!(
                "Dataset name cannot contain '/', '\\' or '.': {}",
                name
            )));
        }

        if trimmed.len() > MAX_DATASET_NAME_LEN {
            return Err(MemoryError::Validation(format!(
                "Dataset name too long (max {} characters)",
                MAX_DATASET_NAME_LEN
            )));
        }

        Ok(())
    }

    /// Existing regular file; symlinks are followed.
    pub fn validate_file_path(path: &Path) -> Result<()> {
        let canonical = fs::canonicalize(path).map_err(|e| {
            MemoryError::Validation(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::require(canonical.is_file(), "Path is not a file", &canonical)
    }

    pub fn validate_directory(path: &Path) -> Result<()> {
        Self::require(path.exists(), "Directory does not exist", path)?;
        Self::require(path.is_dir(), "Path is not a directory", path)
    }

    fn require(condition: bool, reason: &str, path: &Path) -> Result<()> {
        if condition {
            Ok(())
        } else {
            Err(MemoryError::Validation(format!(
                "{}: {}",
                reason,
                path.display()
            )))
        }
    }

    pub fn validate_content_not_empty(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(MemoryError::Validation("Content is empty".to_string()));
        }
        Ok(())
    }

    pub fn validate_query(query: &str) -> Result<()> {
        if query.trim().is_empty() {
            return Err(MemoryError::Validation(
                "Search query cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_top_k(top_k: usize) -> Result<()> {
        if (1..=MAX_TOP_K).contains(&top_k) {
            Ok(())
        } else {
            Err(MemoryError::Validation(format!(
                "top_k must be between 1 and {}, got {}",
                MAX_TOP_K, top_k
            )))
        }
    }

    /// Truncates on a character boundary and appends an ellipsis.
    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_dataset_name() {
        assert!(Validator::validate_dataset_name("cs_explanations").is_ok());
        assert!(Validator::validate_dataset_name("main dataset").is_ok());
        assert!(Validator::validate_dataset_name("").is_err());
        assert!(Validator::validate_dataset_name("   ").is_err());
        assert!(Validator::validate_dataset_name("a/b").is_err());
        assert!(Validator::validate_dataset_name("a\\b").is_err());
        assert!(Validator::validate_dataset_name("v1.0").is_err());
        assert!(Validator::validate_dataset_name(&"x".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_file_path() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("notes.txt");
        fs::write(&file_path, "test").unwrap();

        assert!(Validator::validate_file_path(&file_path).is_ok());
        assert!(Validator::validate_file_path(temp.path()).is_err());
        assert!(Validator::validate_file_path(Path::new("/nonexistent")).is_err());
    }

    #[test]
    fn test_validate_directory() {
        let temp = TempDir::new().unwrap();
        assert!(Validator::validate_directory(temp.path()).is_ok());
        assert!(Validator::validate_directory(Path::new("/nonexistent")).is_err());
    }

    #[test]
    fn test_validate_content_not_empty() {
        assert!(Validator::validate_content_not_empty("content").is_ok());
        assert!(Validator::validate_content_not_empty("").is_err());
        assert!(Validator::validate_content_not_empty("   ").is_err());
    }

    #[test]
    fn test_validate_query_and_top_k() {
        assert!(Validator::validate_query("What is a qubit?").is_ok());
        assert!(Validator::validate_query(" \n").is_err());
        assert!(Validator::validate_top_k(5).is_ok());
        assert!(Validator::validate_top_k(0).is_err());
        assert!(Validator::validate_top_k(1001).is_err());
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(Validator::truncate_text("short", 10), "short");
        assert_eq!(
            Validator::truncate_text("this is a very long text", 10),
            "this is a ..."
        );
        assert_eq!(Validator::truncate_text("héllo wörld", 5), "héllo...");
    }
}
