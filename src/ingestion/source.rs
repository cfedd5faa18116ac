// file: src/ingestion/source.rs
// description: ingestion inputs: raw text, single files or directories
// reference: file:// prefixed locations and existing paths

use std::fmt;
use std::path::{Path, PathBuf};

const FILE_SCHEME: &str = "file://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Text(String),
    File(PathBuf),
    Directory(PathBuf),
}

impl DataSource {
    /// `file://` locations and existing paths are files or directories; anything else is text.
    pub fn infer(input: &str) -> Self {
        if let Some(location) = input.strip_prefix(FILE_SCHEME) {
            let path = PathBuf::from(location);
            return if path.is_dir() {
                Self::Directory(path)
            } else {
                Self::File(path)
            };
        }

        let trimmed = input.trim();
        if !trimmed.is_empty() && !trimmed.contains('\n') && trimmed.len() < 4096 {
            let path = Path::new(trimmed);
            if path.is_dir() {
                return Self::Directory(path.to_path_buf());
            }
            if path.is_file() {
                return Self::File(path.to_path_buf());
            }
        }

        Self::Text(input.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::File(_) => "file",
            Self::Directory(_) => "directory",
        }
    }
}

impl From<&str> for DataSource {
    fn from(input: &str) -> Self {
        Self::infer(input)
    }
}

impl From<String> for DataSource {
    fn from(input: String) -> Self {
        Self::infer(&input)
    }
}

impl From<PathBuf> for DataSource {
    fn from(path: PathBuf) -> Self {
        if path.is_dir() {
            Self::Directory(path)
        } else {
            Self::File(path)
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => {
                let preview: String = text.chars().take(40).collect();
                write!(f, "text({})", preview)
            }
            Self::File(path) => write!(f, "file({})", path.display()),
            Self::Directory(path) => write!(f, "directory({})", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plain_text_is_text() {
        let source = DataSource::infer("Natural language processing is a subfield.");
        assert_eq!(source.kind(), "text");
    }

    #[test]
    fn test_existing_paths() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("nlp.txt");
        std::fs::write(&file, "content").unwrap();

        assert_eq!(
            DataSource::infer(file.to_str().unwrap()),
            DataSource::File(file.clone())
        );
        assert_eq!(
            DataSource::infer(temp.path().to_str().unwrap()),
            DataSource::Directory(temp.path().to_path_buf())
        );
    }

    #[test]
    fn test_file_scheme() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("missing.txt");
        let input = format!("file://{}", file.display());

        assert_eq!(DataSource::from(input.as_str()), DataSource::File(file));
    }
}
