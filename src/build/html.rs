//! HTML rendering of a rewritten [`DocumentTree`].
//!
//! The tree is flattened back into pulldown-cmark events and written with
//! `pulldown_cmark::html`. Annotation nodes become `<kbd>` badges, code blocks
//! go through the syntax highlighter, and headings get permalink ids.

use std::collections::HashSet;

use pulldown_cmark::{CowStr, Event, Tag, html};
use serde::Serialize;

use super::highlight::SyntaxHighlighter;
use super::tree::{Container, ContainerKind, DocumentTree, Node, Opaque};
use crate::util::{escape_html, slugify};

/// Result of rendering a document, containing both HTML and table of contents.
#[derive(Debug, Clone)]
pub struct MarkdownOutput {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// A table of contents entry for the current page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// The heading text
    pub text: String,
    /// The heading id (for anchor links)
    pub id: String,
    /// The heading level (1-6)
    pub level: u8,
}

/// Render a document tree to an HTML fragment.
///
/// `kbd_class` is the CSS class put on annotation badges.
pub fn render_html(
    tree: &DocumentTree,
    highlighter: &SyntaxHighlighter,
    kbd_class: &str,
) -> MarkdownOutput {
    // Explicit `{#id}`s are reserved before any slug is generated
    let mut used_ids = HashSet::new();
    collect_explicit_ids(tree.children(), &mut used_ids);

    let mut renderer = HtmlRenderer {
        highlighter,
        kbd_class,
        used_ids,
        toc: Vec::new(),
    };

    let mut events = Vec::new();
    renderer.push_nodes(tree.children(), &mut events);

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());

    MarkdownOutput {
        html: html_output,
        toc: renderer.toc,
    }
}

struct HtmlRenderer<'a> {
    highlighter: &'a SyntaxHighlighter,
    kbd_class: &'a str,
    used_ids: HashSet<String>,
    toc: Vec<TocEntry>,
}

impl HtmlRenderer<'_> {
    fn push_nodes(&mut self, nodes: &[Node], events: &mut Vec<Event<'static>>) {
        for node in nodes {
            match node {
                Node::Text(value) => events.push(Event::Text(CowStr::from(value.clone()))),
                Node::Annotation(payload) => events.push(Event::InlineHtml(
                    format!(
                        "<kbd class=\"{}\">{}</kbd>",
                        escape_html(self.kbd_class),
                        escape_html(payload)
                    )
                    .into(),
                )),
                Node::Container(container) => self.push_container(container, events),
                Node::Opaque(Opaque::CodeBlock { language, code }) => {
                    let highlighted = self.highlighter.highlight(code, language);
                    events.push(Event::Html(highlighted.into()));
                }
                Node::Opaque(Opaque::Events(raw)) => events.extend(raw.iter().cloned()),
            }
        }
    }

    fn push_container(&mut self, container: &Container, events: &mut Vec<Event<'static>>) {
        let (tag, end) = match &container.kind {
            ContainerKind::Document => return self.push_nodes(&container.children, events),
            ContainerKind::Element { tag, end } => (tag, *end),
        };

        if let Tag::Heading {
            level,
            id,
            classes,
            attrs,
        } = tag
        {
            let text = plain_text(&container.children);

            // Headings that already have an id keep it
            if let Some(existing_id) = id {
                self.toc.push(TocEntry {
                    text,
                    id: existing_id.to_string(),
                    level: *level as u8,
                });
            } else {
                let mut inner = Vec::new();
                self.push_nodes(&container.children, &mut inner);
                let mut inner_html = String::new();
                html::push_html(&mut inner_html, inner.into_iter());

                let id = self.unique_id(&text);
                self.toc.push(TocEntry {
                    text,
                    id: id.clone(),
                    level: *level as u8,
                });

                let class_attr = if classes.is_empty() {
                    String::new()
                } else {
                    let classes: Vec<&str> = classes.iter().map(|c| c.as_ref()).collect();
                    format!(" class=\"{}\"", classes.join(" "))
                };
                let extra_attrs = attrs
                    .iter()
                    .map(|(k, v)| match v {
                        Some(val) => format!(" {}=\"{}\"", k, escape_html(val)),
                        None => format!(" {}", k),
                    })
                    .collect::<String>();
                let permalink = format!(
                    "<a class=\"header-anchor\" href=\"#{}\" aria-label=\"Link to this heading\">#</a>",
                    id
                );

                events.push(Event::Html(
                    format!(
                        "<h{level} id=\"{id}\"{class_attr}{extra_attrs}>{inner_html} {permalink}</h{level}>\n",
                        level = *level as usize,
                    )
                    .into(),
                ));
                return;
            }
        }

        events.push(Event::Start(tag.clone()));
        self.push_nodes(&container.children, events);
        events.push(Event::End(end));
    }

    /// Slug id for a heading, suffixed with `-N` if already taken.
    fn unique_id(&mut self, text: &str) -> String {
        let base_id = slugify(text);
        let mut id = base_id.clone();
        let mut suffix = 1;
        while self.used_ids.contains(&id) {
            id = format!("{}-{}", base_id, suffix);
            suffix += 1;
        }
        self.used_ids.insert(id.clone());
        id
    }
}

fn collect_explicit_ids(nodes: &[Node], ids: &mut HashSet<String>) {
    for node in nodes {
        if let Node::Container(container) = node {
            if let ContainerKind::Element {
                tag: Tag::Heading { id: Some(id), .. },
                ..
            } = &container.kind
            {
                ids.insert(id.to_string());
            }
            collect_explicit_ids(&container.children, ids);
        }
    }
}

/// Visible text of a node sequence, with annotation payloads inline.
fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(value) | Node::Annotation(value) => out.push_str(value),
            Node::Container(c) => out.push_str(&plain_text(&c.children)),
            Node::Opaque(opaque) => out.push_str(&opaque.literal()),
        }
    }
    out
}
