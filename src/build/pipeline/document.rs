//! Document types for pipeline processing.

use crate::build::document::Document;
use crate::build::html::TocEntry;
use crate::build::rewrite::RewriteStats;
use crate::build::tree::DocumentTree;

/// A document being processed through the pipeline.
///
/// Wraps the loaded `Document` with state that evolves through the stages:
///
/// 1. Initially: only `doc` is set
/// 2. After parse: `tree` holds the parsed markdown
/// 3. After substitutions: `tree` is rewritten, `stats` populated
/// 4. After render: `html` and `toc` populated
#[derive(Debug)]
pub struct ProcessingDocument {
    /// The loaded document (front matter and markdown body)
    pub doc: Document,

    /// Parsed tree. None until the parse stage runs.
    pub tree: Option<DocumentTree>,

    /// Counters from the substitutions stage.
    pub stats: Option<RewriteStats>,

    /// Rendered HTML fragment. None until the render stage runs.
    pub html: Option<String>,

    /// Table of contents extracted during rendering.
    pub toc: Vec<TocEntry>,
}

impl ProcessingDocument {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            tree: None,
            stats: None,
            html: None,
            toc: Vec::new(),
        }
    }

    /// Get the document's slug (for output file names).
    pub fn slug(&self) -> &str {
        &self.doc.slug
    }

    /// Get the document title.
    pub fn title(&self) -> String {
        self.doc.title()
    }
}
