pub mod document;
pub mod highlight;
pub mod html;
pub mod markdown;
pub mod pipeline;
pub mod rewrite;
pub mod tree;

pub use document::Document;
pub use pipeline::{OutputFormat, Pipeline, PipelineContext, ProcessingDocument, StylesheetStage};
