//! Symbol substitution and `::annotation::` extraction over a document tree.
//!
//! Every text node is visited once, in document order. Its value goes through
//! the [`SymbolTable`] and is then split by the [`AnnotationRule`]. Nodes that
//! contain annotations are replaced in place by the resulting sequence of text
//! and annotation nodes.
//!
//! The pass runs in two phases. [`TextRewriter::plan`] walks the tree
//! read-only and records one edit per changed text node. [`RewritePlan::apply`]
//! then splices the edits in reverse document order, so an edit never shifts
//! the position of one that is still pending and nodes inserted by the pass are
//! never visited again.

use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::tree::{Container, DocumentTree, Node};

/// Errors constructing a symbol table or annotation rule.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RuleError {
    #[error("substitution trigger must not be empty (replacement {0:?})")]
    EmptyTrigger(String),

    #[error("annotation delimiter must not be empty")]
    EmptyDelimiter,
}

/// Tree inconsistencies found while applying a rewrite plan.
///
/// These indicate a tree that changed shape between planning and applying,
/// never a problem with the document text itself.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RewriteError {
    #[error("text node parent at {path:?} is not a container in this tree")]
    MissingParent { path: Vec<usize> },

    #[error("container at {path:?} has no planned text node at index {index}")]
    MissingChild { path: Vec<usize>, index: usize },
}

// =============================================================================
// Symbol table
// =============================================================================

/// Ordered mapping from trigger strings to their replacements.
///
/// Entries are applied one after another in definition order, each replacing
/// every non-overlapping occurrence in the current value. A later entry never
/// re-triggers an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    entries: Vec<(String, String)>,
}

impl SymbolTable {
    /// An empty table. Substitution is the identity.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a table from pairs, keeping their order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::empty();
        for (trigger, replacement) in pairs {
            table.insert(trigger, replacement)?;
        }
        Ok(table)
    }

    /// Add an entry. Redefining a trigger updates its replacement but keeps
    /// its original position.
    pub fn insert(
        &mut self,
        trigger: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<(), RuleError> {
        let trigger = trigger.into();
        let replacement = replacement.into();
        if trigger.is_empty() {
            return Err(RuleError::EmptyTrigger(replacement));
        }
        match self.entries.iter_mut().find(|(t, _)| *t == trigger) {
            Some(entry) => entry.1 = replacement,
            None => self.entries.push((trigger, replacement)),
        }
        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, r)| (t.as_str(), r.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every entry to `value`, in order.
    pub fn apply(&self, value: &str) -> String {
        let mut value = value.to_string();
        for (trigger, replacement) in &self.entries {
            if value.contains(trigger.as_str()) {
                value = value.replace(trigger.as_str(), replacement);
            }
        }
        value
    }
}

impl Default for SymbolTable {
    /// Arrows and hearts.
    fn default() -> Self {
        Self {
            entries: vec![
                ("->".to_string(), "→".to_string()),
                ("<-".to_string(), "←".to_string()),
                ("<3".to_string(), "♥".to_string()),
            ],
        }
    }
}

impl Serialize for SymbolTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (trigger, replacement) in &self.entries {
            map.serialize_entry(trigger, replacement)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SymbolTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = SymbolTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of trigger strings to replacement strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                use serde::de::Error;

                let mut table = SymbolTable::empty();
                while let Some((trigger, replacement)) =
                    access.next_entry::<String, String>()?
                {
                    table.insert(trigger, replacement).map_err(A::Error::custom)?;
                }
                Ok(table)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(SymbolTable::empty())
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

// =============================================================================
// Annotation rule
// =============================================================================

/// A piece of a text value after annotation splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// Payload between two delimiters, trimmed.
    Annotation(String),
}

impl Segment {
    pub fn is_annotation(&self) -> bool {
        matches!(self, Segment::Annotation(_))
    }
}

impl From<Segment> for Node {
    fn from(segment: Segment) -> Self {
        match segment {
            Segment::Text(value) => Node::Text(value),
            Segment::Annotation(payload) => Node::Annotation(payload),
        }
    }
}

/// Recognizes `<delim>payload<delim>` spans.
///
/// Matching is non-greedy and left to right: an opening delimiter is closed by
/// the next delimiter on the same line. An opener with no closer on its line is
/// plain text, and the scan resumes one character after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRule {
    delimiter: String,
}

impl AnnotationRule {
    pub fn new(delimiter: impl Into<String>) -> Result<Self, RuleError> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(RuleError::EmptyDelimiter);
        }
        Ok(Self { delimiter })
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Split `value` into text and annotation segments, in order.
    ///
    /// Zero-length text segments are dropped, so `"::::"` yields a single empty
    /// annotation and a value without annotations yields at most one segment.
    pub fn split(&self, value: &str) -> Vec<Segment> {
        let delim = self.delimiter.as_str();
        // Length of the delimiter's first char: the step when an opener fails
        let step = delim.chars().next().map_or(1, char::len_utf8);

        let mut segments = Vec::new();
        let mut text_start = 0;
        let mut search = 0;

        while let Some(offset) = value[search..].find(delim) {
            let open = search + offset;
            let payload_start = open + delim.len();

            match self.find_close(value, payload_start) {
                Some(close) => {
                    push_text(&mut segments, &value[text_start..open]);
                    segments.push(Segment::Annotation(
                        value[payload_start..close].trim().to_string(),
                    ));
                    text_start = close + delim.len();
                    search = text_start;
                }
                None => search = open + step,
            }
        }

        push_text(&mut segments, &value[text_start..]);
        segments
    }

    /// Byte offset of the delimiter closing a payload starting at `from`.
    fn find_close(&self, value: &str, from: usize) -> Option<usize> {
        let rest = &value[from..];
        let close = rest.find(self.delimiter.as_str())?;
        if rest[..close].contains(is_line_terminator) {
            return None;
        }
        Some(from + close)
    }
}

impl Default for AnnotationRule {
    fn default() -> Self {
        Self {
            delimiter: "::".to_string(),
        }
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Text(text.to_string()));
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

// =============================================================================
// Rewriter
// =============================================================================

/// Counters from a rewrite pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Text nodes visited.
    pub text_nodes: usize,
    /// Text nodes whose value changed through symbol substitution.
    pub substituted: usize,
    /// Text nodes replaced by a sequence of segments.
    pub split: usize,
    /// Annotation nodes created.
    pub annotations: usize,
}

/// A planned replacement of one text node.
#[derive(Debug, Clone)]
struct Edit {
    /// Path from the root to the parent container.
    parent: Vec<usize>,
    /// Position of the text node among its siblings.
    index: usize,
    /// The text node's value when the edit was planned.
    original: String,
    replacement: Vec<Node>,
}

/// Edits recorded by [`TextRewriter::plan`], in document order.
#[derive(Debug, Clone)]
pub struct RewritePlan {
    edits: Vec<Edit>,
    stats: RewriteStats,
}

impl RewritePlan {
    /// Number of text nodes that will be replaced.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Splice the planned edits into `tree`, last edit first.
    ///
    /// Fails if a planned parent or text node can no longer be found where the
    /// plan expects it.
    pub fn apply(self, tree: &mut DocumentTree) -> Result<RewriteStats, RewriteError> {
        for edit in self.edits.into_iter().rev() {
            let parent = tree
                .container_at_mut(&edit.parent)
                .ok_or_else(|| RewriteError::MissingParent {
                    path: edit.parent.clone(),
                })?;

            match parent.children.get(edit.index) {
                Some(Node::Text(value)) if *value == edit.original => {}
                _ => {
                    return Err(RewriteError::MissingChild {
                        path: edit.parent,
                        index: edit.index,
                    });
                }
            }

            parent
                .children
                .splice(edit.index..=edit.index, edit.replacement);
        }
        Ok(self.stats)
    }
}

/// Rewrites the text nodes of a document with a symbol table and annotation rule.
///
/// Both are borrowed read-only, so one table can serve many documents.
#[derive(Debug, Clone, Copy)]
pub struct TextRewriter<'a> {
    table: &'a SymbolTable,
    rule: &'a AnnotationRule,
}

impl<'a> TextRewriter<'a> {
    pub fn new(table: &'a SymbolTable, rule: &'a AnnotationRule) -> Self {
        Self { table, rule }
    }

    /// Rewrite every text node in `tree`.
    pub fn rewrite(&self, tree: &mut DocumentTree) -> Result<RewriteStats, RewriteError> {
        self.plan(tree).apply(tree)
    }

    /// Substitute and split a single text value.
    pub fn rewrite_text(&self, value: &str) -> Vec<Segment> {
        self.rule.split(&self.table.apply(value))
    }

    /// Walk `tree` in document order and record the edits a rewrite makes.
    pub fn plan(&self, tree: &DocumentTree) -> RewritePlan {
        let mut plan = RewritePlan {
            edits: Vec::new(),
            stats: RewriteStats::default(),
        };
        let mut path = Vec::new();
        self.plan_container(&tree.root, &mut path, &mut plan);
        plan
    }

    fn plan_container(&self, container: &Container, path: &mut Vec<usize>, plan: &mut RewritePlan) {
        for (index, child) in container.children.iter().enumerate() {
            match child {
                Node::Text(value) => {
                    plan.stats.text_nodes += 1;
                    if let Some(replacement) = self.plan_text(value, &mut plan.stats) {
                        plan.edits.push(Edit {
                            parent: path.clone(),
                            index,
                            original: value.clone(),
                            replacement,
                        });
                    }
                }
                Node::Container(inner) => {
                    path.push(index);
                    self.plan_container(inner, path, plan);
                    path.pop();
                }
                Node::Annotation(_) | Node::Opaque(_) => {}
            }
        }
    }

    /// Replacement nodes for one text value, or `None` if it is unchanged.
    fn plan_text(&self, value: &str, stats: &mut RewriteStats) -> Option<Vec<Node>> {
        let substituted = self.table.apply(value);
        let changed = substituted != value;
        if changed {
            stats.substituted += 1;
        }

        let segments = self.rule.split(&substituted);
        let annotations = segments.iter().filter(|s| s.is_annotation()).count();

        if annotations == 0 {
            return changed.then(|| vec![Node::Text(substituted)]);
        }

        stats.split += 1;
        stats.annotations += annotations;
        Some(segments.into_iter().map(Node::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use pulldown_cmark::{Tag, TagEnd};

    use super::*;

    fn segments(value: &str) -> Vec<Segment> {
        let table = SymbolTable::default();
        let rule = AnnotationRule::default();
        TextRewriter::new(&table, &rule).rewrite_text(value)
    }

    fn text(s: &str) -> Segment {
        Segment::Text(s.to_string())
    }

    fn ann(s: &str) -> Segment {
        Segment::Annotation(s.to_string())
    }

    fn paragraph(children: Vec<Node>) -> Node {
        Node::Container(Container::element(
            Tag::Paragraph,
            TagEnd::Paragraph,
            children,
        ))
    }

    #[test]
    fn test_default_table() {
        let table = SymbolTable::default();
        assert_eq!(table.apply("a -> b <- c <3"), "a → b ← c ♥");
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_substitution_is_idempotent_without_triggers() {
        let table = SymbolTable::default();
        let once = table.apply("left <- right -> love <3");
        assert_eq!(table.apply(&once), once);
    }

    #[test]
    fn test_substitution_follows_table_order() {
        let table = SymbolTable::from_pairs([("ab", "X"), ("b", "Y")]).unwrap();
        assert_eq!(table.apply("ab"), "X");

        let reversed = SymbolTable::from_pairs([("b", "Y"), ("ab", "X")]).unwrap();
        assert_eq!(reversed.apply("ab"), "aY");
    }

    #[test]
    fn test_later_entry_does_not_retrigger_earlier() {
        // "=" becomes "->", which stays literal because "->" already ran
        let table = SymbolTable::from_pairs([("->", "→"), ("=", "->")]).unwrap();
        assert_eq!(table.apply("a = b"), "a -> b");
    }

    #[test]
    fn test_substitution_is_non_overlapping() {
        let table = SymbolTable::from_pairs([("aa", "b")]).unwrap();
        assert_eq!(table.apply("aaa"), "ba");
    }

    #[test]
    fn test_redefined_trigger_keeps_position() {
        let table = SymbolTable::from_pairs([("ab", "X"), ("b", "Y"), ("ab", "Z")]).unwrap();
        let entries: Vec<_> = table.entries().collect();
        assert_eq!(entries, vec![("ab", "Z"), ("b", "Y")]);
    }

    #[test]
    fn test_empty_trigger_rejected() {
        let result = SymbolTable::from_pairs([("", "x")]);
        assert_eq!(result, Err(RuleError::EmptyTrigger("x".to_string())));
        assert_eq!(AnnotationRule::new(""), Err(RuleError::EmptyDelimiter));
    }

    #[test]
    fn test_table_deserializes_in_order() {
        let yaml = "\"<3\": \"♥\"\n\"ab\": X\n\"b\": Y\n";
        let table: SymbolTable = serde_yaml::from_str(yaml).unwrap();
        let entries: Vec<_> = table.entries().collect();
        assert_eq!(entries, vec![("<3", "♥"), ("ab", "X"), ("b", "Y")]);

        let empty: SymbolTable = serde_yaml::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_table_rejects_empty_trigger_when_deserializing() {
        let result: Result<SymbolTable, _> = serde_yaml::from_str("\"\": x\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_annotation_extraction() {
        assert_eq!(
            segments("press ::Ctrl+C:: to quit"),
            vec![text("press "), ann("Ctrl+C"), text(" to quit")]
        );
    }

    #[test]
    fn test_unterminated_delimiter_is_text() {
        assert_eq!(segments("a :: b"), vec![text("a :: b")]);
        assert_eq!(segments("a :: b -> c"), vec![text("a :: b → c")]);
    }

    #[test]
    fn test_combined_substitution_and_annotation() {
        assert_eq!(segments("go -> ::here::"), vec![text("go → "), ann("here")]);
    }

    #[test]
    fn test_payload_is_trimmed() {
        assert_eq!(segments("::  spaced out  ::"), vec![ann("spaced out")]);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(segments("::::"), vec![ann("")]);
    }

    #[test]
    fn test_delimiters_pair_left_to_right() {
        assert_eq!(
            segments("::a::b::c::"),
            vec![ann("a"), text("b"), ann("c")]
        );
        // Odd count: the last delimiter stays literal
        assert_eq!(
            segments("::a:: then ::b"),
            vec![ann("a"), text(" then ::b")]
        );
    }

    #[test]
    fn test_closer_is_first_delimiter_after_opener() {
        // Non-greedy: ":::x::" opens at 0 and the payload starts with ':'
        assert_eq!(segments(":::x::"), vec![ann(":x")]);
    }

    #[test]
    fn test_payload_does_not_cross_lines() {
        assert_eq!(
            segments("::a\n::b::"),
            vec![text("::a\n"), ann("b")]
        );
        assert_eq!(segments("::a\nb::"), vec![text("::a\nb::")]);
    }

    #[test]
    fn test_payload_is_substituted_first() {
        assert_eq!(segments("::<3::"), vec![ann("♥")]);
    }

    #[test]
    fn test_custom_delimiter() {
        let table = SymbolTable::empty();
        let rule = AnnotationRule::new("%%").unwrap();
        let rewriter = TextRewriter::new(&table, &rule);
        assert_eq!(
            rewriter.rewrite_text("hit %%Enter%% ::not::"),
            vec![text("hit "), ann("Enter"), text(" ::not::")]
        );
    }

    #[test]
    fn test_empty_table_still_splits() {
        let table = SymbolTable::empty();
        let rule = AnnotationRule::default();
        let rewriter = TextRewriter::new(&table, &rule);
        assert_eq!(
            rewriter.rewrite_text("a -> ::b::"),
            vec![text("a -> "), ann("b")]
        );
    }

    #[test]
    fn test_sibling_order_preserved() {
        let mut tree = DocumentTree::new(vec![paragraph(vec![
            Node::text("A"),
            Node::text("x::y::z"),
            Node::text("C"),
        ])]);

        let table = SymbolTable::default();
        let rule = AnnotationRule::default();
        let stats = TextRewriter::new(&table, &rule).rewrite(&mut tree).unwrap();

        assert_eq!(
            tree.container_at(&[0]).unwrap().children,
            vec![
                Node::text("A"),
                Node::text("x"),
                Node::annotation("y"),
                Node::text("z"),
                Node::text("C"),
            ]
        );
        assert_eq!(stats.text_nodes, 3);
        assert_eq!(stats.split, 1);
        assert_eq!(stats.annotations, 1);
    }

    #[test]
    fn test_multiple_splits_in_one_container() {
        let mut tree = DocumentTree::new(vec![paragraph(vec![
            Node::text("::a:: b"),
            Node::annotation("kept"),
            Node::text("c ::d::"),
        ])]);

        let table = SymbolTable::default();
        let rule = AnnotationRule::default();
        TextRewriter::new(&table, &rule).rewrite(&mut tree).unwrap();

        assert_eq!(
            tree.container_at(&[0]).unwrap().children,
            vec![
                Node::annotation("a"),
                Node::text(" b"),
                Node::annotation("kept"),
                Node::text("c "),
                Node::annotation("d"),
            ]
        );
    }

    #[test]
    fn test_nested_containers_after_split_sibling() {
        // The split in the first child shifts the nested paragraph's index
        let mut tree = DocumentTree::new(vec![
            Node::text("::k:: -> x"),
            paragraph(vec![Node::text("<3 ::y::")]),
        ]);

        let table = SymbolTable::default();
        let rule = AnnotationRule::default();
        let stats = TextRewriter::new(&table, &rule).rewrite(&mut tree).unwrap();

        assert_eq!(
            tree.children(),
            &[
                Node::annotation("k"),
                Node::text(" → x"),
                paragraph(vec![Node::text("♥ "), Node::annotation("y")]),
            ]
        );
        assert_eq!(tree.annotations(), vec!["k", "y"]);
        assert_eq!(stats.substituted, 2);
    }

    #[test]
    fn test_substitution_only_keeps_node() {
        let mut tree = DocumentTree::new(vec![paragraph(vec![
            Node::text("a -> b"),
            Node::text("plain"),
        ])]);

        let table = SymbolTable::default();
        let rule = AnnotationRule::default();
        let rewriter = TextRewriter::new(&table, &rule);
        let plan = rewriter.plan(&tree);
        assert_eq!(plan.len(), 1);
        plan.apply(&mut tree).unwrap();

        assert_eq!(
            tree.container_at(&[0]).unwrap().children,
            vec![Node::text("a → b"), Node::text("plain")]
        );
    }

    #[test]
    fn test_annotation_payloads_not_revisited() {
        let mut tree = DocumentTree::new(vec![paragraph(vec![Node::text("::a -> b::")])]);

        let table = SymbolTable::default();
        let rule = AnnotationRule::default();
        let rewriter = TextRewriter::new(&table, &rule);
        rewriter.rewrite(&mut tree).unwrap();
        let second = rewriter.rewrite(&mut tree).unwrap();

        assert_eq!(tree.annotations(), vec!["a → b"]);
        assert_eq!(second.text_nodes, 0);
    }

    #[test]
    fn test_shared_table_across_threads() {
        let table = SymbolTable::default();
        let rule = AnnotationRule::default();
        let rewriter = TextRewriter::new(&table, &rule);

        let mut trees: Vec<DocumentTree> = (0..4)
            .map(|i| DocumentTree::new(vec![paragraph(vec![Node::text(format!("{i} -> ::k{i}::"))])]))
            .collect();

        std::thread::scope(|scope| {
            for tree in trees.iter_mut() {
                scope.spawn(move || rewriter.rewrite(tree).unwrap());
            }
        });

        for (i, tree) in trees.iter().enumerate() {
            assert_eq!(tree.annotations(), vec![format!("k{i}")]);
        }
    }

    #[test]
    fn test_unchanged_tree_has_empty_plan() {
        let tree = DocumentTree::new(vec![paragraph(vec![Node::text("nothing here")])]);
        let table = SymbolTable::default();
        let rule = AnnotationRule::default();
        assert!(TextRewriter::new(&table, &rule).plan(&tree).is_empty());
    }

    #[test]
    fn test_apply_to_reshaped_tree_fails() {
        let planned = DocumentTree::new(vec![paragraph(vec![Node::text("::a::")])]);
        let table = SymbolTable::default();
        let rule = AnnotationRule::default();
        let rewriter = TextRewriter::new(&table, &rule);

        // Parent path no longer leads to a container
        let mut flat = DocumentTree::new(vec![Node::text("::a::")]);
        assert_eq!(
            rewriter.plan(&planned).apply(&mut flat),
            Err(RewriteError::MissingParent { path: vec![0] })
        );

        // Parent exists but the text node is gone
        let mut emptied = DocumentTree::new(vec![paragraph(vec![])]);
        assert_eq!(
            rewriter.plan(&planned).apply(&mut emptied),
            Err(RewriteError::MissingChild {
                path: vec![0],
                index: 0
            })
        );

        // Text node at the index has different content
        let mut changed = DocumentTree::new(vec![paragraph(vec![Node::text("other")])]);
        assert!(rewriter.plan(&planned).apply(&mut changed).is_err());
    }
}
