use autumnus::{HtmlLinkedBuilder, formatter::Formatter, languages::Language, themes};

use crate::util::escape_html;

/// Syntax highlighting for code blocks, using autumnus (tree-sitter based).
///
/// Highlighted code is emitted with CSS classes; the matching stylesheet comes
/// from [`SyntaxHighlighter::generate_css`].
pub struct SyntaxHighlighter {
    theme_name: String,
}

impl SyntaxHighlighter {
    pub fn new(theme_name: &str) -> Self {
        Self {
            theme_name: theme_name.to_string(),
        }
    }

    pub fn theme_name(&self) -> &str {
        &self.theme_name
    }

    /// Highlight `code` given a fenced code block's info string.
    ///
    /// Only the first word of the info string names the language
    /// (`rust title="main.rs"` is Rust). Unknown languages fall back to a
    /// plain, escaped `<pre><code>` block.
    pub fn highlight(&self, code: &str, info: &str) -> String {
        let language = info.split_whitespace().next().unwrap_or("");
        let lang = Language::guess(language, code);

        if matches!(lang, Language::PlainText)
            && !language.is_empty()
            && language != "plaintext"
            && language != "text"
        {
            return plain_code_block(code, language);
        }

        let formatter = match HtmlLinkedBuilder::new().source(code).lang(lang).build() {
            Ok(f) => f,
            Err(_) => return plain_code_block(code, language),
        };

        let mut output: Vec<u8> = Vec::new();
        if formatter.format(&mut output).is_err() {
            return plain_code_block(code, language);
        }
        String::from_utf8(output).unwrap_or_else(|_| plain_code_block(code, language))
    }

    /// Stylesheet for the current theme, if the theme exists.
    pub fn generate_css(&self) -> Option<String> {
        let theme = themes::get(&self.theme_name).ok()?;
        Some(theme.css(false))
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new("github-dark")
    }
}

fn plain_code_block(code: &str, language: &str) -> String {
    let escaped = escape_html(code);
    if language.is_empty() {
        format!("<pre><code>{}</code></pre>", escaped)
    } else {
        format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            escape_html(language),
            escaped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust() {
        let highlighter = SyntaxHighlighter::default();
        let result = highlighter.highlight("fn main() {}", "rust");
        assert!(result.contains("<pre"));
        assert!(result.contains("</pre>"));
    }

    #[test]
    fn test_highlight_unknown_language() {
        let highlighter = SyntaxHighlighter::default();
        let result = highlighter.highlight("a < b", "unknown_lang_xyz");
        assert_eq!(
            result,
            "<pre><code class=\"language-unknown_lang_xyz\">a &lt; b</code></pre>"
        );
    }

    #[test]
    fn test_info_string_extras_ignored() {
        let highlighter = SyntaxHighlighter::default();
        let result = highlighter.highlight("x", "unknown_lang_xyz title=\"a\"");
        assert!(result.contains("language-unknown_lang_xyz\""));
    }

    #[test]
    fn test_generate_css() {
        let highlighter = SyntaxHighlighter::new("dracula");
        let css = highlighter.generate_css().unwrap();
        assert!(!css.is_empty());

        assert!(SyntaxHighlighter::new("no-such-theme").generate_css().is_none());
    }
}
