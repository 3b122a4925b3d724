//! Markdown parsing into a [`DocumentTree`].

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

use super::tree::{Container, DocumentTree, Node, Opaque};
use crate::config::MarkdownConfig;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),

    #[error("unbalanced markdown events: {0}")]
    Unbalanced(String),
}

/// Parser options for the configured extensions.
pub fn markdown_options(markdown_config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &markdown_config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

/// Parse markdown (without front matter) into a document tree.
pub fn parse_markdown(
    markdown: &str,
    markdown_config: &MarkdownConfig,
) -> Result<DocumentTree, MarkdownError> {
    let options = markdown_options(markdown_config)?;
    let mut builder = TreeBuilder::default();
    for event in Parser::new_ext(markdown, options) {
        builder.push(event.into_static())?;
    }
    builder.finish()
}

/// An open container waiting for its end event.
struct Frame {
    tag: Tag<'static>,
    children: Vec<Node>,
}

/// Events of an opaque element, collected until its matching end.
struct Capture {
    depth: usize,
    events: Vec<Event<'static>>,
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Frame>,
    capture: Option<Capture>,
}

impl TreeBuilder {
    fn push(&mut self, event: Event<'static>) -> Result<(), MarkdownError> {
        if let Some(capture) = &mut self.capture {
            match &event {
                Event::Start(_) => capture.depth += 1,
                Event::End(_) => capture.depth -= 1,
                _ => {}
            }
            capture.events.push(event);
            if capture.depth == 0 {
                if let Some(capture) = self.capture.take() {
                    self.append(Node::Opaque(opaque_element(capture.events)));
                }
            }
            return Ok(());
        }

        match event {
            Event::Start(tag) if is_opaque(&tag) => {
                self.capture = Some(Capture {
                    depth: 1,
                    events: vec![Event::Start(tag)],
                });
            }
            Event::Start(tag) => self.stack.push(Frame {
                tag,
                children: Vec::new(),
            }),
            Event::End(end) => {
                let frame = self
                    .stack
                    .pop()
                    .ok_or_else(|| MarkdownError::Unbalanced(format!("{:?} with no start", end)))?;
                self.append(Node::Container(Container::element(
                    frame.tag,
                    end,
                    frame.children,
                )));
            }
            // Adjacent text events become one node
            Event::Text(text) => {
                let children = self.children_mut();
                if let Some(Node::Text(value)) = children.last_mut() {
                    value.push_str(&text);
                } else {
                    children.push(Node::Text(text.to_string()));
                }
            }
            other => self.append(Node::Opaque(Opaque::Events(vec![other]))),
        }
        Ok(())
    }

    fn children_mut(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        }
    }

    fn append(&mut self, node: Node) {
        self.children_mut().push(node);
    }

    fn finish(self) -> Result<DocumentTree, MarkdownError> {
        if let Some(frame) = self.stack.last() {
            return Err(MarkdownError::Unbalanced(format!(
                "{:?} was never closed",
                frame.tag
            )));
        }
        if self.capture.is_some() {
            return Err(MarkdownError::Unbalanced(
                "document ended inside a passthrough element".to_string(),
            ));
        }
        Ok(DocumentTree::new(self.root))
    }
}

/// Elements whose text is not prose: code, raw HTML, image alt text, metadata.
fn is_opaque(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::CodeBlock(_) | Tag::HtmlBlock | Tag::Image { .. } | Tag::MetadataBlock(_)
    )
}

fn opaque_element(events: Vec<Event<'static>>) -> Opaque {
    let language = match events.first() {
        Some(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang)))) => Some(lang.to_string()),
        Some(Event::Start(Tag::CodeBlock(CodeBlockKind::Indented))) => Some(String::new()),
        _ => None,
    };
    let Some(language) = language else {
        return Opaque::Events(events);
    };

    let code = events
        .iter()
        .filter_map(|event| match event {
            Event::Text(text) => Some(text.as_ref()),
            _ => None,
        })
        .collect();
    Opaque::CodeBlock { language, code }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::tree::ContainerKind;

    fn parse(markdown: &str) -> DocumentTree {
        parse_markdown(markdown, &MarkdownConfig::default()).unwrap()
    }

    fn paragraph_children(tree: &DocumentTree, index: usize) -> &[Node] {
        &tree.container_at(&[index]).unwrap().children
    }

    #[test]
    fn test_parse_paragraphs() {
        let tree = parse("Hello\n\nWorld");

        assert_eq!(tree.children().len(), 2);
        assert_eq!(paragraph_children(&tree, 0), &[Node::text("Hello")]);
        assert_eq!(paragraph_children(&tree, 1), &[Node::text("World")]);
    }

    #[test]
    fn test_text_events_are_merged() {
        let tree = parse("I <3 you -> ::Ctrl+C::");
        assert_eq!(
            paragraph_children(&tree, 0),
            &[Node::text("I <3 you -> ::Ctrl+C::")]
        );
    }

    #[test]
    fn test_inline_containers_nest() {
        let tree = parse("a *b* c");
        let children = paragraph_children(&tree, 0);

        assert_eq!(children.len(), 3);
        match &children[1] {
            Node::Container(c) => {
                assert_eq!(c.type_name(), "emphasis");
                assert_eq!(c.children, vec![Node::text("b")]);
            }
            other => panic!("expected emphasis, got {:?}", other),
        }
    }

    #[test]
    fn test_code_is_opaque() {
        let tree = parse("```rust\nlet x = a -> b;\n```\n\nuse `a -> b` here");

        assert_eq!(
            tree.children()[0],
            Node::Opaque(Opaque::CodeBlock {
                language: "rust".to_string(),
                code: "let x = a -> b;\n".to_string(),
            })
        );
        let children = paragraph_children(&tree, 1);
        assert_eq!(children[0], Node::text("use "));
        assert!(matches!(children[1], Node::Opaque(_)));
        assert_eq!(children[2], Node::text(" here"));
    }

    #[test]
    fn test_image_alt_text_is_opaque() {
        let tree = parse("![a -> b](pic.png)");
        let children = paragraph_children(&tree, 0);
        assert_eq!(children.len(), 1);
        assert!(matches!(children[0], Node::Opaque(Opaque::Events(_))));
    }

    #[test]
    fn test_root_is_document() {
        let tree = parse("# Title");
        assert_eq!(tree.root.kind, ContainerKind::Document);
        assert_eq!(tree.container_at(&[0]).unwrap().type_name(), "heading");
    }

    #[test]
    fn test_invalid_extension() {
        let config = MarkdownConfig {
            extensions: vec!["not_a_real_extension".to_string()],
        };

        let result = parse_markdown("# Test", &config);
        assert!(matches!(result, Err(MarkdownError::InvalidExtension(_))));
    }

    #[test]
    fn test_unbalanced_end() {
        let mut builder = TreeBuilder::default();
        let result = builder.push(Event::End(pulldown_cmark::TagEnd::Paragraph));
        assert!(matches!(result, Err(MarkdownError::Unbalanced(_))));
    }

    #[test]
    fn test_unclosed_start() {
        let mut builder = TreeBuilder::default();
        builder.push(Event::Start(Tag::Paragraph)).unwrap();
        assert!(matches!(builder.finish(), Err(MarkdownError::Unbalanced(_))));
    }
}
