// file: src/ingestion/classifier.rs
// description: file type classification by extension
// reference: extension to mime type mapping

use crate::error::{MemoryError, Result};
use std::path::Path;

const SUPPORTED: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("markdown", "text/markdown"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("rst", "text/x-rst"),
    ("log", "text/plain"),
];

pub struct FileClassifier;

impl FileClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Returns `(extension, mime_type)` for a supported text file.
    pub fn classify(&self, path: &Path) -> Result<(String, String)> {
        let extension = Self::extension(path);

        SUPPORTED
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
            .ok_or_else(|| {
                MemoryError::Ingestion(format!(
                    "Unsupported file type '{}': {}",
                    extension,
                    path.display()
                ))
            })
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        let extension = Self::extension(path);
        SUPPORTED.iter().any(|(ext, _)| *ext == extension)
    }

    fn extension(path: &Path) -> String {
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }
}

impl Default for FileClassifier {
    fn default() -> Self {
        Self::new()
    }
}
