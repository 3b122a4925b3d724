//! Text rewrite stage.

use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};
use crate::build::rewrite::{RewriteStats, TextRewriter};

/// Stage that applies symbol substitutions and extracts `::annotations::`.
///
/// Every document is rewritten with the same borrowed symbol table and
/// annotation rule from the context.
pub struct SubstitutionStage;

impl Stage for SubstitutionStage {
    fn name(&self) -> &'static str {
        "substitutions"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        let rewriter = TextRewriter::new(ctx.symbols, ctx.annotation_rule);
        let mut total = RewriteStats::default();

        for doc in docs {
            let slug = doc.doc.slug.as_str();
            let tree = doc.tree.as_mut().ok_or_else(|| {
                PipelineError::stage(
                    "substitutions",
                    format!("document '{}' has no tree (was parse stage run?)", slug),
                )
            })?;

            let stats = rewriter.rewrite(tree)?;
            tracing::debug!(
                slug,
                substituted = stats.substituted,
                annotations = stats.annotations,
                "rewrote text nodes"
            );

            total.text_nodes += stats.text_nodes;
            total.substituted += stats.substituted;
            total.split += stats.split;
            total.annotations += stats.annotations;
            doc.stats = Some(stats);
        }

        tracing::info!(
            text_nodes = total.text_nodes,
            substituted = total.substituted,
            annotations = total.annotations,
            "applied substitutions"
        );
        Ok(())
    }
}
