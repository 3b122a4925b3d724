//! Configuration type definitions.
//!
//! These types are pure data - no I/O or complex logic.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::build::rewrite::{AnnotationRule, RuleError, SymbolTable};

/// Contents of `kbdmark.yaml`. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory rendered files are written to; stdout when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    /// Ordered trigger -> replacement table applied to prose text
    #[serde(default)]
    pub substitutions: SymbolTable,
    #[serde(default)]
    pub annotations: AnnotationConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
}

/// Markdown processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "footnotes".to_string(),
        "gfm".to_string(),
        "heading_attributes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}

/// Inline `::annotation::` settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationConfig {
    /// Delimiter on both sides of an annotation
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// CSS class of the rendered `<kbd>` badge
    #[serde(default = "default_kbd_class")]
    pub class: String,
}

fn default_delimiter() -> String {
    "::".to_string()
}

fn default_kbd_class() -> String {
    "kbd".to_string()
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            class: default_kbd_class(),
        }
    }
}

impl AnnotationConfig {
    pub fn rule(&self) -> Result<AnnotationRule, RuleError> {
        AnnotationRule::new(self.delimiter.clone())
    }
}

/// Code block highlighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// autumnus theme name
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_theme() -> String {
    "github-dark".to_string()
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
        }
    }
}
