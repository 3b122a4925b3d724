//! Document tree shared by the parser, the text rewriter and the renderer.
//!
//! The tree only distinguishes the node kinds the rewrite pass cares about.
//! Everything else the markdown parser produces (code, raw HTML, breaks,
//! images, ...) is carried through untouched as [`Opaque`].

use pulldown_cmark::{Event, Tag, TagEnd};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A node in a [`DocumentTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Plain prose text.
    Text(String),
    /// An inline `::payload::` annotation, rendered as a keyboard badge.
    Annotation(String),
    /// A node with ordered children (paragraph, heading, emphasis, link, ...).
    Container(Container),
    /// A node kind this pipeline passes through unmodified.
    Opaque(Opaque),
}

impl Node {
    /// Shorthand for a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    /// Shorthand for an annotation node.
    pub fn annotation(payload: impl Into<String>) -> Self {
        Node::Annotation(payload.into())
    }
}

/// What opened a container.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerKind {
    /// The document root. Never has a parent.
    Document,
    /// A markdown element, with the tag that opened it and the tag that closes it.
    Element { tag: Tag<'static>, end: TagEnd },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub kind: ContainerKind,
    pub children: Vec<Node>,
}

impl Container {
    pub fn element(tag: Tag<'static>, end: TagEnd, children: Vec<Node>) -> Self {
        Self {
            kind: ContainerKind::Element { tag, end },
            children,
        }
    }

    /// The node type name used in the JSON form of the tree.
    pub fn type_name(&self) -> &'static str {
        let tag = match &self.kind {
            ContainerKind::Document => return "root",
            ContainerKind::Element { tag, .. } => tag,
        };
        match tag {
            Tag::Paragraph => "paragraph",
            Tag::Heading { .. } => "heading",
            Tag::BlockQuote(_) => "blockquote",
            Tag::List(_) => "list",
            Tag::Item => "listItem",
            Tag::FootnoteDefinition(_) => "footnoteDefinition",
            Tag::Table(_) => "table",
            Tag::TableHead => "tableHead",
            Tag::TableRow => "tableRow",
            Tag::TableCell => "tableCell",
            Tag::Emphasis => "emphasis",
            Tag::Strong => "strong",
            Tag::Strikethrough => "delete",
            Tag::Link { .. } => "link",
            _ => "element",
        }
    }
}

/// Node kinds outside the rewrite pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Opaque {
    /// A fenced or indented code block.
    CodeBlock { language: String, code: String },
    /// Any other run of parser events, replayed verbatim when rendering.
    Events(Vec<Event<'static>>),
}

impl Opaque {
    /// Concatenated literal content of the node (code, HTML, math source).
    pub fn literal(&self) -> String {
        match self {
            Opaque::CodeBlock { code, .. } => code.clone(),
            Opaque::Events(events) => events
                .iter()
                .filter_map(|event| match event {
                    Event::Text(s)
                    | Event::Code(s)
                    | Event::Html(s)
                    | Event::InlineHtml(s)
                    | Event::InlineMath(s)
                    | Event::DisplayMath(s) => Some(s.as_ref()),
                    _ => None,
                })
                .collect(),
        }
    }
}

/// A parsed markdown document.
///
/// Created per render, rewritten once, then handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTree {
    pub root: Container,
}

impl DocumentTree {
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            root: Container {
                kind: ContainerKind::Document,
                children,
            },
        }
    }

    /// Top-level nodes of the document.
    pub fn children(&self) -> &[Node] {
        &self.root.children
    }

    /// Resolve a path of child indices to a container, starting at the root.
    pub fn container_at(&self, path: &[usize]) -> Option<&Container> {
        let mut current = &self.root;
        for &index in path {
            match current.children.get(index) {
                Some(Node::Container(child)) => current = child,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Mutable variant of [`DocumentTree::container_at`].
    pub fn container_at_mut(&mut self, path: &[usize]) -> Option<&mut Container> {
        let mut current = &mut self.root;
        for &index in path {
            match current.children.get_mut(index) {
                Some(Node::Container(child)) => current = child,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Number of text nodes in the document.
    pub fn text_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    Node::Text(_) => 1,
                    Node::Container(c) => count(&c.children),
                    _ => 0,
                })
                .sum()
        }
        count(&self.root.children)
    }

    /// Annotation payloads in document order.
    pub fn annotations(&self) -> Vec<&str> {
        fn collect<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
            for node in nodes {
                match node {
                    Node::Annotation(payload) => out.push(payload),
                    Node::Container(c) => collect(&c.children, out),
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.root.children, &mut out);
        out
    }
}

impl Serialize for DocumentTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

impl Serialize for Container {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.type_name())?;
        if let ContainerKind::Element { tag, .. } = &self.kind {
            match tag {
                Tag::Heading { level, id, .. } => {
                    map.serialize_entry("depth", &(*level as u8))?;
                    if let Some(id) = id {
                        map.serialize_entry("id", id.as_ref())?;
                    }
                }
                Tag::Link {
                    dest_url, title, ..
                } => {
                    map.serialize_entry("url", dest_url.as_ref())?;
                    if !title.is_empty() {
                        map.serialize_entry("title", title.as_ref())?;
                    }
                }
                Tag::List(start) => {
                    map.serialize_entry("ordered", &start.is_some())?;
                    if let Some(start) = start {
                        map.serialize_entry("start", start)?;
                    }
                }
                _ => {}
            }
        }
        map.serialize_entry("children", &self.children)?;
        map.end()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Container(container) => container.serialize(serializer),
            Node::Text(value) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "text")?;
                map.serialize_entry("value", value)?;
                map.end()
            }
            Node::Annotation(payload) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "annotation")?;
                map.serialize_entry("value", payload)?;
                map.end()
            }
            Node::Opaque(Opaque::CodeBlock { language, code }) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "code")?;
                map.serialize_entry("lang", language)?;
                map.serialize_entry("value", code)?;
                map.end()
            }
            Node::Opaque(opaque) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "raw")?;
                map.serialize_entry("value", &opaque.literal())?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(children: Vec<Node>) -> Node {
        Node::Container(Container::element(
            Tag::Paragraph,
            TagEnd::Paragraph,
            children,
        ))
    }

    #[test]
    fn test_container_at_resolves_nested_paths() {
        let tree = DocumentTree::new(vec![
            Node::text("top"),
            paragraph(vec![Node::text("a"), paragraph(vec![Node::text("b")])]),
        ]);

        assert_eq!(tree.container_at(&[]).unwrap().children.len(), 2);
        assert_eq!(tree.container_at(&[1]).unwrap().children.len(), 2);
        assert_eq!(
            tree.container_at(&[1, 1]).unwrap().children,
            vec![Node::text("b")]
        );
        // Index 0 is a text node, not a container
        assert!(tree.container_at(&[0]).is_none());
        assert!(tree.container_at(&[5]).is_none());
    }

    #[test]
    fn test_counts_and_annotations() {
        let tree = DocumentTree::new(vec![paragraph(vec![
            Node::text("press "),
            Node::annotation("Ctrl"),
            Node::text(" and "),
            Node::annotation("C"),
        ])]);

        assert_eq!(tree.text_count(), 2);
        assert_eq!(tree.annotations(), vec!["Ctrl", "C"]);
    }

    #[test]
    fn test_json_form() {
        let tree = DocumentTree::new(vec![
            paragraph(vec![Node::text("go "), Node::annotation("here")]),
            Node::Opaque(Opaque::CodeBlock {
                language: "rust".to_string(),
                code: "fn main() {}\n".to_string(),
            }),
        ]);

        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["type"], "root");
        assert_eq!(json["children"][0]["type"], "paragraph");
        assert_eq!(json["children"][0]["children"][0]["value"], "go ");
        assert_eq!(json["children"][0]["children"][1]["type"], "annotation");
        assert_eq!(json["children"][0]["children"][1]["value"], "here");
        assert_eq!(json["children"][1]["type"], "code");
        assert_eq!(json["children"][1]["lang"], "rust");
    }

    #[test]
    fn test_opaque_literal() {
        let opaque = Opaque::Events(vec![Event::Code("a -> b".into())]);
        assert_eq!(opaque.literal(), "a -> b");
    }
}
