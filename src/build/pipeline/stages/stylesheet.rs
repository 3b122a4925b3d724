//! Stylesheet finalize stage.

use crate::build::pipeline::{FinalizeStage, PipelineContext, PipelineError};

/// Name of the stylesheet written next to the rendered documents.
pub const STYLESHEET_FILE: &str = "kbdmark.css";

/// Finalize stage that writes the `<kbd>` badge and syntax theme CSS.
///
/// Does nothing when writing to stdout.
pub struct StylesheetStage;

impl FinalizeStage for StylesheetStage {
    fn name(&self) -> &'static str {
        "stylesheet"
    }

    fn finalize(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let Some(dir) = ctx.output_dir else {
            return Ok(());
        };

        let mut css = kbd_css(ctx.kbd_class);
        match ctx.highlighter.generate_css() {
            Some(theme_css) => {
                css.push('\n');
                css.push_str(&theme_css);
            }
            None => tracing::warn!(
                theme = ctx.highlighter.theme_name(),
                "unknown highlight theme, stylesheet has no code colors"
            ),
        }

        std::fs::create_dir_all(dir)?;
        let path = dir.join(STYLESHEET_FILE);
        std::fs::write(&path, css)?;
        ctx.written.push(path);
        Ok(())
    }
}

fn kbd_css(class: &str) -> String {
    format!(
        r#".{class} {{
  display: inline-block;
  padding: 0.1em 0.45em;
  font-family: ui-monospace, SFMono-Regular, Menlo, monospace;
  font-size: 0.85em;
  line-height: 1.4;
  border: 1px solid #d0d7de;
  border-bottom-width: 2px;
  border-radius: 0.3em;
  background: #f6f8fa;
  white-space: nowrap;
}}
"#
    )
}
