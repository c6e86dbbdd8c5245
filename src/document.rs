//! Document model adapter
//!
//! Raw markup is first run through an ordered list of [`Substitution`]s and
//! then parsed by html5ever (via `scraper`), which never fails: malformed
//! input yields a best-effort tree. [`Node`] is a cheap handle into that tree
//! that also covers attributes, so queries can select `@href` like any other
//! node.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use ego_tree::{NodeId, NodeRef};
use regex::Regex;
use scraper::Html;

use crate::error::RuleError;

/// One preprocessing step applied to raw markup before parsing.
#[derive(Debug, Clone)]
pub struct Substitution {
    pattern: Pattern,
    replacement: String,
}

#[derive(Debug, Clone)]
enum Pattern {
    Literal(String),
    Regex(Regex),
}

impl Substitution {
    /// Replace every occurrence of `pattern` verbatim.
    pub fn literal(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Substitution {
            pattern: Pattern::Literal(pattern.into()),
            replacement: replacement.into(),
        }
    }

    /// Replace every match of a regular expression. The replacement may
    /// refer to groups as `$1` or `${name}`.
    pub fn regex(pattern: &str, replacement: impl Into<String>) -> Result<Self, RuleError> {
        let regex = Regex::new(pattern).map_err(|source| RuleError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Substitution {
            pattern: Pattern::Regex(regex),
            replacement: replacement.into(),
        })
    }

    pub fn apply(&self, text: &str) -> String {
        match &self.pattern {
            Pattern::Literal(p) if p.is_empty() => text.to_string(),
            Pattern::Literal(p) => text.replace(p.as_str(), &self.replacement),
            Pattern::Regex(re) => re.replace_all(text, self.replacement.as_str()).into_owned(),
        }
    }
}

/// Apply substitutions left to right. Each runs once over the output of the
/// previous one; replacement text is never rescanned by the same step.
pub fn preprocess(markup: &str, substitutions: &[Substitution]) -> String {
    substitutions
        .iter()
        .fold(markup.to_string(), |text, sub| sub.apply(&text))
}

/// A parsed HTML document.
pub struct Document {
    html: Html,
    order: HashMap<NodeId, usize>,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        let html = Html::parse_document(markup);
        let order = html
            .tree
            .root()
            .descendants()
            .enumerate()
            .map(|(index, node)| (node.id(), index))
            .collect();
        Document { html, order }
    }

    pub fn root(&self) -> Node<'_> {
        Node {
            doc: self,
            node: self.html.tree.root(),
            attr: None,
        }
    }

    fn position(&self, id: NodeId) -> usize {
        self.order.get(&id).copied().unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    Other,
}

/// A position in a [`Document`]: a tree node, or one attribute of an element.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    doc: &'a Document,
    node: NodeRef<'a, scraper::Node>,
    attr: Option<usize>,
}

impl<'a> Node<'a> {
    fn tree(&self, node: NodeRef<'a, scraper::Node>) -> Node<'a> {
        Node {
            doc: self.doc,
            node,
            attr: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        if self.attr.is_some() {
            return NodeKind::Attribute;
        }
        match self.node.value() {
            scraper::Node::Document | scraper::Node::Fragment => NodeKind::Root,
            scraper::Node::Element(_) => NodeKind::Element,
            scraper::Node::Text(_) => NodeKind::Text,
            scraper::Node::Comment(_) => NodeKind::Comment,
            _ => NodeKind::Other,
        }
    }

    pub fn root(&self) -> Node<'a> {
        self.doc.root()
    }

    /// Element or attribute name; empty for every other kind.
    pub fn name(&self) -> &'a str {
        match (self.node.value(), self.attr) {
            (scraper::Node::Element(el), Some(index)) => {
                el.attrs().nth(index).map(|(name, _)| name).unwrap_or("")
            }
            (scraper::Node::Element(el), None) => el.name(),
            _ => "",
        }
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        match self.node.value() {
            scraper::Node::Element(el) if self.attr.is_none() => el.attr(name),
            _ => None,
        }
    }

    /// XPath string-value: concatenated descendant text for elements and the
    /// root, the value itself for attributes, text and comments.
    pub fn string_value(&self) -> String {
        match (self.node.value(), self.attr) {
            (scraper::Node::Element(el), Some(index)) => el
                .attrs()
                .nth(index)
                .map(|(_, value)| value.to_string())
                .unwrap_or_default(),
            (scraper::Node::Text(text), _) => text.to_string(),
            (scraper::Node::Comment(comment), _) => comment.to_string(),
            (scraper::Node::Element(_), None)
            | (scraper::Node::Document, _)
            | (scraper::Node::Fragment, _) => {
                let mut out = String::new();
                for node in self.node.descendants() {
                    if let Some(text) = node.value().as_text() {
                        out.push_str(text);
                    }
                }
                out
            }
            _ => String::new(),
        }
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        if self.attr.is_some() {
            return Some(self.tree(self.node));
        }
        self.node.parent().map(|parent| self.tree(parent))
    }

    pub fn children(&self) -> Vec<Node<'a>> {
        if self.attr.is_some() {
            return vec![];
        }
        self.node.children().map(|child| self.tree(child)).collect()
    }

    pub fn attributes(&self) -> Vec<Node<'a>> {
        match self.node.value() {
            scraper::Node::Element(el) if self.attr.is_none() => (0..el.attrs().count())
                .map(|index| Node {
                    doc: self.doc,
                    node: self.node,
                    attr: Some(index),
                })
                .collect(),
            _ => vec![],
        }
    }

    /// Nearest first.
    pub fn ancestors(&self) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(node) = current {
            current = node.parent();
            out.push(node);
        }
        out
    }

    /// Document order, excluding `self`.
    pub fn descendants(&self) -> Vec<Node<'a>> {
        if self.attr.is_some() {
            return vec![];
        }
        self.node
            .descendants()
            .skip(1)
            .map(|node| self.tree(node))
            .collect()
    }

    pub fn following_siblings(&self) -> Vec<Node<'a>> {
        if self.attr.is_some() {
            return vec![];
        }
        self.node
            .next_siblings()
            .map(|node| self.tree(node))
            .collect()
    }

    /// Nearest first.
    pub fn preceding_siblings(&self) -> Vec<Node<'a>> {
        if self.attr.is_some() {
            return vec![];
        }
        self.node
            .prev_siblings()
            .map(|node| self.tree(node))
            .collect()
    }

    /// Everything after this node's subtree, in document order.
    pub fn following(&self) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        let mut current = Some(*self);
        if self.attr.is_some() {
            // an attribute is followed by its owner's content
            let owner = self.tree(self.node);
            out.extend(owner.descendants());
            current = Some(owner);
        }
        while let Some(node) = current {
            for sibling in node.following_siblings() {
                out.push(sibling);
                out.extend(sibling.descendants());
            }
            current = node.parent();
        }
        out
    }

    /// Everything before this node that is not an ancestor, nearest first.
    pub fn preceding(&self) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        let mut current = Some(if self.attr.is_some() {
            self.tree(self.node)
        } else {
            *self
        });
        while let Some(node) = current {
            for sibling in node.preceding_siblings() {
                let mut subtree = sibling.descendants();
                subtree.reverse();
                out.extend(subtree);
                out.push(sibling);
            }
            current = node.parent();
        }
        out
    }

    fn sort_key(&self) -> (usize, usize) {
        (
            self.doc.position(self.node.id()),
            self.attr.map_or(0, |index| index + 1),
        )
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc)
            && self.node.id() == other.node.id()
            && self.attr == other.attr
    }
}

impl Eq for Node<'_> {}

impl Hash for Node<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.id().hash(state);
        self.attr.hash(state);
    }
}

impl PartialOrd for Node<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Document order; attributes sort right after their element.
impl Ord for Node<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("position", &self.sort_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"
        <html><body>
            <div id="a"><h4>Born:</h4> <time datetime="1960-05-17">May 17</time></div>
            <!-- note -->
            <div id="b"><span>x</span><span>y</span></div>
        </body></html>
    "#;

    fn find<'a>(doc: &'a Document, id: &str) -> Node<'a> {
        doc.root()
            .descendants()
            .into_iter()
            .find(|n| n.attr("id") == Some(id))
            .unwrap()
    }

    #[test]
    fn test_preprocess_in_order() {
        let subs = vec![
            Substitution::literal("<br/>", "<br>"),
            Substitution::regex(r"<br>\s*", "\n").unwrap(),
        ];
        assert_eq!(preprocess("a<br/> b<br>c", &subs), "a\nb\nc");
    }

    #[test]
    fn test_preprocess_not_recursive() {
        let subs = vec![Substitution::literal("a", "aa")];
        assert_eq!(preprocess("a-a", &subs), "aa-aa");
    }

    #[test]
    fn test_invalid_regex_rejected() {
        assert!(matches!(
            Substitution::regex("(", ""),
            Err(RuleError::Pattern { .. })
        ));
    }

    #[test]
    fn test_parse_tolerates_garbage() {
        let doc = Document::parse("<div><p>unclosed <b>tags");
        assert_eq!(doc.root().string_value(), "unclosed tags");
        let empty = Document::parse("");
        assert_eq!(empty.root().kind(), NodeKind::Root);
    }

    #[test]
    fn test_string_value_and_attributes() {
        let doc = Document::parse(HTML);
        let a = find(&doc, "a");
        assert_eq!(a.string_value(), "Born: May 17");

        let time = a.children().into_iter().find(|n| n.name() == "time").unwrap();
        let attrs = time.attributes();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].kind(), NodeKind::Attribute);
        assert_eq!(attrs[0].name(), "datetime");
        assert_eq!(attrs[0].string_value(), "1960-05-17");
        assert_eq!(attrs[0].parent(), Some(time));
    }

    #[test]
    fn test_document_order() {
        let doc = Document::parse(HTML);
        let a = find(&doc, "a");
        let b = find(&doc, "b");
        assert!(a < b);
        assert!(a < a.attributes()[0]);
        assert!(a.attributes()[0] < a.children()[0]);

        let following = a.following();
        assert!(following.contains(&b));
        assert!(following.windows(2).all(|w| w[0] < w[1]));

        let preceding = b.preceding();
        assert!(preceding.iter().any(|n| n.kind() == NodeKind::Comment));
        assert!(preceding.windows(2).all(|w| w[0] > w[1]));
        assert!(!preceding.contains(&b.parent().unwrap()));
    }
}
