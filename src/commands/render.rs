use crate::{
    RenderArgs,
    build::{
        Document, OutputFormat, Pipeline, PipelineContext, ProcessingDocument, StylesheetStage,
        highlight::SyntaxHighlighter,
    },
    config::Config,
};

pub async fn run(args: &RenderArgs) -> Result<(), anyhow::Error> {
    let config = Config::load_from_arg(args.config_file.as_deref()).await?;
    let rule = config.annotations.rule()?;

    // Load documents, skipping drafts unless asked for
    let mut docs = Vec::new();
    for path in &args.files {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let doc = Document::from_source(path.clone(), &raw);

        if doc.is_draft() && !args.drafts {
            tracing::warn!(path = %path.display(), "skipping draft (use --drafts to render)");
            continue;
        }
        docs.push(ProcessingDocument::new(doc));
    }

    if docs.is_empty() {
        tracing::warn!("nothing to render");
        return Ok(());
    }
    docs.sort_by(|a, b| a.doc.listing_cmp(&b.doc));

    let output_dir = args.output.as_deref().or(config.output.as_deref());
    let highlighter = SyntaxHighlighter::new(&config.highlight.theme);

    let mut pipeline = Pipeline::default_pipeline();
    if output_dir.is_some() && args.format == OutputFormat::Html {
        pipeline.add_finalize_stage(StylesheetStage);
    }

    let mut ctx = PipelineContext::new(
        &config.substitutions,
        &rule,
        &config.markdown,
        &config.annotations.class,
        &highlighter,
        output_dir,
        args.format,
    );
    pipeline.run(&mut docs, &mut ctx)?;

    let annotations: usize = docs
        .iter()
        .filter_map(|doc| doc.stats)
        .map(|stats| stats.annotations)
        .sum();
    tracing::info!(
        documents = docs.len(),
        annotations,
        "rendered documents"
    );

    if let Some(dir) = output_dir {
        println!(
            "Wrote {} file(s) to {}",
            ctx.written.len(),
            dir.display()
        );
    }

    Ok(())
}
