use std::path::Path;

use findex_core::traits::Classifier;
use findex_core::types::{ContextRecord, Document};

use crate::classifier::RuleBasedClassifier;

/// Preview length in characters, line breaks collapsed.
pub const PREVIEW_LEN: usize = 100;

/// Derives a [`ContextRecord`] from a document and its extracted text.
/// Pure: no side effects beyond the returned record.
pub struct ContextBuilder {
    classifier: Box<dyn Classifier>,
}

impl ContextBuilder {
    pub fn new(classifier: Box<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn with_default_rules() -> Self {
        Self::new(Box::new(RuleBasedClassifier::default()))
    }

    /// The classifier seam, shared with query-side topic inference.
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn build(&self, document: &Document, text: &str) -> ContextRecord {
        let filename = Path::new(&document.path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| document.path.clone());
        ContextRecord {
            document_id: document.id.clone(),
            topic: self.classifier.classify(text),
            category: self.classifier.classify_name(&filename),
            preview: preview(text, PREVIEW_LEN),
            last_modified: document.modified_time,
        }
    }
}

/// First `n` characters with line breaks collapsed to spaces.
fn preview(text: &str, n: usize) -> String {
    text.replace("\r\n", " ")
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .take(n)
        .collect()
}
