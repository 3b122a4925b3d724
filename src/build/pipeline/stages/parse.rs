//! Markdown parsing stage.

use crate::build::markdown::parse_markdown;
use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Stage that parses each document's markdown body into a tree.
///
/// After this stage, `doc.tree` is set. Front matter was already
/// stripped when the document was loaded.
pub struct ParseStage;

impl Stage for ParseStage {
    fn name(&self) -> &'static str {
        "parse"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            let tree = parse_markdown(&doc.doc.body, ctx.markdown_config).map_err(|e| {
                PipelineError::stage(
                    "parse",
                    format!("failed to parse {}: {}", doc.doc.source_path.display(), e),
                )
            })?;

            tracing::debug!(
                slug = doc.slug(),
                text_nodes = tree.text_count(),
                "parsed document"
            );
            doc.tree = Some(tree);
        }

        Ok(())
    }
}
