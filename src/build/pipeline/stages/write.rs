//! Output writing stage.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use serde_json::json;

use crate::build::pipeline::{
    OutputFormat, PipelineContext, PipelineError, ProcessingDocument, Stage,
};

/// Stage that writes each document in the context's output format.
///
/// With an output directory, each document becomes `<slug>.html` or
/// `<slug>.json` there (the directory is created if needed). Without one,
/// documents are written to stdout in order.
pub struct WriteStage;

impl Stage for WriteStage {
    fn name(&self) -> &'static str {
        "write"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        if let Some(dir) = ctx.output_dir {
            check_unique_slugs(docs)?;
            std::fs::create_dir_all(dir)?;
        }

        for doc in docs.iter() {
            let contents = match ctx.format {
                OutputFormat::Html => doc.html.clone().ok_or_else(|| {
                    PipelineError::stage(
                        "write",
                        format!(
                            "document '{}' has no HTML output (was render stage run?)",
                            doc.slug()
                        ),
                    )
                })?,
                OutputFormat::Json => document_json(doc)?,
            };

            match ctx.output_dir {
                Some(dir) => {
                    let path = dir.join(format!("{}.{}", doc.slug(), ctx.format.extension()));
                    std::fs::write(&path, contents)?;
                    tracing::debug!(path = %path.display(), "wrote document");
                    ctx.written.push(path);
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(contents.as_bytes())?;
                    if !contents.ends_with('\n') {
                        stdout.write_all(b"\n")?;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Each slug names one output file, so two sources may not share it.
fn check_unique_slugs(docs: &[ProcessingDocument]) -> Result<(), PipelineError> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for doc in docs {
        let path = doc.doc.source_path.as_path();
        if let Some(first) = seen.insert(doc.slug(), path) {
            return Err(PipelineError::stage(
                "write",
                format!(
                    "{} and {} both write '{}'",
                    first.display(),
                    path.display(),
                    doc.slug()
                ),
            ));
        }
    }
    Ok(())
}

/// Front matter, table of contents and rewritten tree of a document.
fn document_json(doc: &ProcessingDocument) -> Result<String, PipelineError> {
    let tree = doc.tree.as_ref().ok_or_else(|| {
        PipelineError::stage(
            "write",
            format!("document '{}' has no tree (was parse stage run?)", doc.slug()),
        )
    })?;

    let value = json!({
        "slug": doc.slug(),
        "title": doc.title(),
        "front_matter": doc.doc.front_matter,
        "toc": doc.toc,
        "tree": tree,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
