//! HTML rendering stage.

use crate::build::html::render_html;
use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Stage that renders each rewritten tree to an HTML fragment.
///
/// After this stage, `doc.html` contains the fragment and `doc.toc`
/// the extracted headings.
pub struct RenderStage;

impl Stage for RenderStage {
    fn name(&self) -> &'static str {
        "render"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            let tree = doc.tree.as_ref().ok_or_else(|| {
                PipelineError::stage(
                    "render",
                    format!("document '{}' has no tree (was parse stage run?)", doc.slug()),
                )
            })?;

            let output = render_html(tree, ctx.highlighter, ctx.kbd_class);
            doc.html = Some(output.html);
            doc.toc = output.toc;
        }

        Ok(())
    }
}
