use std::path::Path;
use std::time::UNIX_EPOCH;

use findex_core::error::{Error, Result};
use findex_core::traits::FileScanner;
use findex_core::types::ScanEntry;

/// Recursive folder scanner over a fixed extension set. Entries come back
/// sorted by path so indexing runs are deterministic.
pub struct WalkdirScanner {
    extensions: Vec<String>,
}

impl WalkdirScanner {
    pub fn new(extensions: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    pub fn with_default_extensions() -> Self {
        Self::new(&["txt", "md"])
    }

    fn wants(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|want| want == &e.to_lowercase()))
            .unwrap_or(false)
    }
}

impl FileScanner for WalkdirScanner {
    fn scan(&self, root: &Path) -> Result<Vec<ScanEntry>> {
        if !root.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "not a directory: {}",
                root.display()
            )));
        }
        let mut entries = Vec::new();
        for entry in walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if !self.wants(path) {
                continue;
            }
            let Ok(meta) = entry.metadata() else {
                tracing::warn!(path = %path.display(), "unreadable metadata, skipping");
                continue;
            };
            let modified_time = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            entries.push(ScanEntry {
                path: path.to_string_lossy().to_string(),
                size: meta.len(),
                modified_time,
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
