// file: src/ingestion/scanner.rs
// description: directory walking and file discovery with filtering
// reference: https://docs.rs/walkdir

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::ingestion::classifier::FileClassifier;
use crate::utils::validation::Validator;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

pub struct FileScanner {
    skip_patterns: Vec<String>,
    max_file_bytes: u64,
    classifier: FileClassifier,
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub size: u64,
}

impl FileScanner {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            skip_patterns: config.skip_patterns.clone(),
            max_file_bytes: config.max_file_size_mb as u64 * 1024 * 1024,
            classifier: FileClassifier::new(),
        }
    }

    /// Files under `root` that are text-like, not skipped and within the size
    /// limit, sorted by path so ingestion order is stable.
    pub fn scan_directory(&self, root: &Path) -> Result<Vec<ScannedFile>> {
        Validator::validate_directory(root)?;
        info!("Scanning directory: {}", root.display());

        let files: Vec<ScannedFile> = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.should_skip(entry.path()))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| self.accept(root, &entry))
            .collect();

        info!("Found {} ingestible files", files.len());
        Ok(files)
    }

    fn accept(&self, root: &Path, entry: &DirEntry) -> Option<ScannedFile> {
        let path = entry.path();
        if !self.classifier.is_supported(path) {
            debug!("Unsupported file type: {}", path.display());
            return None;
        }

        let size = entry.metadata().ok()?.len();
        if size > self.max_file_bytes {
            debug!("Over size limit ({} bytes): {}", size, path.display());
            return None;
        }

        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();

        Some(ScannedFile {
            path: path.to_path_buf(),
            relative_path,
            size,
        })
    }

    /// `*.ext` matches a suffix, anything else a path fragment.
    fn should_skip(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.skip_patterns.iter().any(|pattern| match pattern.strip_prefix('*') {
            Some(suffix) => path_str.ends_with(suffix),
            None => path_str.contains(pattern.as_str()),
        })
    }
}
