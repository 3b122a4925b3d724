use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::util::title_case;

/// A markdown post loaded from disk.
#[derive(Debug, Clone)]
pub struct Document {
    /// Where the document was read from
    pub source_path: PathBuf,
    /// File stem with the markdown extension removed (e.g., "hello-world")
    pub slug: String,
    /// Front matter metadata
    pub front_matter: FrontMatter,
    /// The markdown content without the front matter block
    pub body: String,
}

impl Document {
    /// Build a document from a file path and its raw contents.
    pub fn from_source(source_path: PathBuf, raw: &str) -> Self {
        let parsed = parse_front_matter(raw);
        let slug = slug_from_path(&source_path);
        Self {
            source_path,
            slug,
            front_matter: parsed.front_matter,
            body: parsed.content,
        }
    }

    /// Get the document title, falling back to the slug if not in front matter.
    pub fn title(&self) -> String {
        self.front_matter
            .title
            .clone()
            .unwrap_or_else(|| title_case(&self.slug))
    }

    pub fn is_draft(&self) -> bool {
        self.front_matter.draft
    }

    /// Listing order: pinned posts first, then newest date first.
    pub fn listing_cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.front_matter, &other.front_matter);
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.date.cmp(&a.date))
    }
}

/// Strip the directory and a `.md`, `.mdx` or `.markdown` extension.
fn slug_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("untitled");
    [".mdx", ".md", ".markdown"]
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name)
        .to_string()
}

/// Front matter metadata parsed from the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrontMatter {
    /// Post title (overrides the slug-derived title)
    pub title: Option<String>,
    /// Short description for previews
    pub description: Option<String>,
    /// Publication date, as written
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub date: Option<String>,
    /// Drafts are skipped unless explicitly requested
    #[serde(default)]
    pub draft: bool,
    /// Tags, either a list or a whitespace-separated string
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    /// Cover image path
    pub cover: Option<String>,
    /// Listed ahead of other posts
    #[serde(default)]
    pub pinned: bool,
    /// Work post rather than a personal one
    #[serde(default)]
    pub work: bool,
    /// Additional arbitrary metadata
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

/// Tags never fail the front matter: scalar items are stringified, others dropped.
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        Some(serde_yaml::Value::Sequence(items)) => {
            items.iter().filter_map(scalar_string).collect()
        }
        Some(value) => scalar_string(&value)
            .map(|words| words.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
        None => Vec::new(),
    })
}

/// A string, number or bool as text; `date: 2024` is as valid as a quoted date.
fn deserialize_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<serde_yaml::Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(scalar_string))
}

fn scalar_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Result of parsing front matter from markdown content.
#[derive(Debug)]
pub struct ParsedContent {
    /// The parsed front matter (empty if none found)
    pub front_matter: FrontMatter,
    /// The markdown content without the front matter block
    pub content: String,
}

/// Parse front matter from markdown content.
///
/// Front matter is a YAML block delimited by `---` at the start of the file:
///
/// ```markdown
/// ---
/// title: Keyboard shortcuts
/// date: 2024-03-01
/// tags: tools editors
/// ---
///
/// Press ::Ctrl+S:: to save.
/// ```
///
/// Malformed YAML is logged and treated as empty front matter.
pub fn parse_front_matter(content: &str) -> ParsedContent {
    let content = content.trim_start();

    if !content.starts_with("---") {
        return ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        };
    }

    let after_opening = &content[3..];
    let Some(closing_pos) = after_opening.find("\n---") else {
        // No closing delimiter, so the whole file is markdown
        return ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        };
    };

    let yaml_content = after_opening[..closing_pos].trim_start_matches('\n');

    // Skip "---" + yaml + "\n---"
    let markdown_start = 3 + closing_pos + 4;
    let markdown_content = content
        .get(markdown_start..)
        .map(|rest| rest.trim_start_matches(['\r', '\n']).to_string())
        .unwrap_or_default();

    let front_matter = if yaml_content.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(yaml_content).unwrap_or_else(|e| {
            tracing::warn!("failed to parse front matter: {}", e);
            FrontMatter::default()
        })
    };

    ParsedContent {
        front_matter,
        content: markdown_content,
    }
}
