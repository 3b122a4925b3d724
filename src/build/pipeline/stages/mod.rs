//! Default pipeline stages.
//!
//! 1. **ParseStage** - Parse markdown into a document tree
//! 2. **SubstitutionStage** - Rewrite text nodes (symbols, annotations)
//! 3. **RenderStage** - Render the tree to HTML with syntax highlighting
//! 4. **WriteStage** - Write HTML or JSON to the output directory or stdout
//!
//! **StylesheetStage** is a finalize stage writing the badge and
//! highlighting CSS next to the rendered files.

mod parse;
mod render;
mod stylesheet;
mod substitutions;
mod write;

pub use parse::ParseStage;
pub use render::RenderStage;
pub use stylesheet::StylesheetStage;
pub use substitutions::SubstitutionStage;
pub use write::WriteStage;
