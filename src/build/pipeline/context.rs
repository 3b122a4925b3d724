//! Pipeline context for sharing state across stages.

use std::path::{Path, PathBuf};

use crate::build::highlight::SyntaxHighlighter;
use crate::build::rewrite::{AnnotationRule, SymbolTable};
use crate::config::MarkdownConfig;

/// What the write stage produces for each document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// HTML fragment
    #[default]
    Html,
    /// Front matter and rewritten document tree as JSON
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

/// Shared context for pipeline stages.
///
/// Configuration is borrowed read-only, so the same symbol table and
/// annotation rule serve every document.
pub struct PipelineContext<'a> {
    // === Rewrite rules ===
    /// Ordered symbol substitutions
    pub symbols: &'a SymbolTable,

    /// Inline annotation delimiter
    pub annotation_rule: &'a AnnotationRule,

    // === Rendering ===
    /// Markdown processing configuration
    pub markdown_config: &'a MarkdownConfig,

    /// CSS class of rendered annotation badges
    pub kbd_class: &'a str,

    /// Syntax highlighter for code blocks
    pub highlighter: &'a SyntaxHighlighter,

    // === Output ===
    /// Directory where output files are written; stdout when None
    pub output_dir: Option<&'a Path>,

    pub format: OutputFormat,

    /// Files written so far
    pub written: Vec<PathBuf>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        symbols: &'a SymbolTable,
        annotation_rule: &'a AnnotationRule,
        markdown_config: &'a MarkdownConfig,
        kbd_class: &'a str,
        highlighter: &'a SyntaxHighlighter,
        output_dir: Option<&'a Path>,
        format: OutputFormat,
    ) -> Self {
        Self {
            symbols,
            annotation_rule,
            markdown_config,
            kbd_class,
            highlighter,
            output_dir,
            format,
            written: Vec::new(),
        }
    }
}
