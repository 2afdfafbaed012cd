//! Markdown-to-markup compiler.
//!
//! Compiles a fixed subset of Markdown into a [`Node`] tree and serializes it
//! to HTML-style markup. Supported blocks: fenced code, ATX headings,
//! horizontal rules, blockquotes, bullet and numbered lists, paragraphs.
//! Supported inlines: strong, emphasis, code spans, links.
//!
//! The compiler never fails. Unterminated constructs run to end of input and
//! emit whatever was collected.

mod block;
mod inline;
mod render;

use serde::Serialize;
use tracing::{debug, instrument};

pub use render::{escape_html, render};

// ---------------------------------------------------------------------------
// Node tree
// ---------------------------------------------------------------------------

/// Semantic element kind of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    /// Heading level 1..=6.
    Heading(u8),
    Paragraph,
    Strong,
    Emphasis,
    Code,
    Link,
    UnorderedList,
    OrderedList,
    ListItem,
    Blockquote,
    HorizontalRule,
    Pre,
}

impl Tag {
    /// Markup element name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Heading(1) => "h1",
            Self::Heading(2) => "h2",
            Self::Heading(3) => "h3",
            Self::Heading(4) => "h4",
            Self::Heading(5) => "h5",
            Self::Heading(_) => "h6",
            Self::Paragraph => "p",
            Self::Strong => "strong",
            Self::Emphasis => "em",
            Self::Code => "code",
            Self::Link => "a",
            Self::UnorderedList => "ul",
            Self::OrderedList => "ol",
            Self::ListItem => "li",
            Self::Blockquote => "blockquote",
            Self::HorizontalRule => "hr",
            Self::Pre => "pre",
        }
    }

    /// Elements serialized as a self-closing tag with no children.
    pub fn is_void(&self) -> bool {
        matches!(self, Self::HorizontalRule)
    }
}

/// A named attribute. Attributes without a value are skipped on output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A child of a [`Node`]: either a nested element or a literal text leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Child {
    Node(Node),
    Text(String),
}

/// An element of the compiled document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub tag: Tag,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<Attribute>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Child>,
}

impl Node {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.attrs.push(Attribute {
            name: name.into(),
            value,
        });
        self
    }

    pub fn with_children(mut self, children: Vec<Child>) -> Self {
        self.children = children;
        self
    }

    /// Append a single text leaf (skipped when empty).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.children.push(Child::Text(text));
        }
        self
    }

    /// Value of the first attribute named `name`, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_deref())
    }

    /// Concatenated text of all descendant leaves.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &Node, out: &mut String) {
    for child in &node.children {
        match child {
            Child::Text(text) => out.push_str(text),
            Child::Node(inner) => collect_text(inner, out),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Compile Markdown text into an ordered sequence of block nodes.
#[instrument(skip_all, fields(len = input.len()))]
pub fn compile(input: &str) -> Vec<Node> {
    let blocks = block::parse_blocks(input);
    debug!(blocks = blocks.len(), "markdown compiled");
    blocks
}

/// Compile Markdown text straight to markup.
pub fn to_html(input: &str) -> String {
    render(&compile(input))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_compiles_and_renders() {
        let blocks = compile("# Title");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].tag, Tag::Heading(1));
        assert_eq!(blocks[0].children, vec![Child::Text("Title".into())]);
        assert_eq!(render(&blocks), "<h1>Title</h1>");
    }

    #[test]
    fn full_document_renders_blocks_on_separate_lines() {
        let md = "\
# Guide

Intro with **bold** and a [link](/docs).

- one
- two

---

> quoted
> text";

        let html = to_html(md);
        assert_eq!(
            html,
            "<h1>Guide</h1>\n\
             <p>Intro with <strong>bold</strong> and a <a href=\"/docs\">link</a>.</p>\n\
             <ul><li>one</li><li>two</li></ul>\n\
             <hr />\n\
             <blockquote>quoted text</blockquote>"
        );
    }

    #[test]
    fn text_is_escaped_exactly_once() {
        let html = to_html("a & b < c > d");
        assert_eq!(html, "<p>a &amp; b &lt; c &gt; d</p>");
        assert!(!html.contains("&amp;amp;"));
    }

    #[test]
    fn pre_escaped_text_is_not_escaped_again() {
        assert_eq!(to_html("a &amp; b &lt;c&gt;"), "<p>a &amp; b &lt;c&gt;</p>");
        assert_eq!(to_html("Tom &amp; Jerry & co"), "<p>Tom &amp; Jerry &amp; co</p>");
    }

    #[test]
    fn quotes_are_not_escaped() {
        assert_eq!(to_html("say \"hi\" 'there'"), "<p>say \"hi\" 'there'</p>");
    }

    #[test]
    fn node_helpers() {
        let node = Node::new(Tag::Link)
            .with_attr("href", Some("/x".into()))
            .with_attr("title", None)
            .with_text("go");
        assert_eq!(node.attr("href"), Some("/x"));
        assert_eq!(node.attr("title"), None);
        assert_eq!(node.text_content(), "go");
    }

    #[test]
    fn tree_serializes_to_json() {
        let blocks = compile("## Hi");
        let json = serde_json::to_value(&blocks).expect("serialize");
        assert_eq!(json[0]["children"][0], serde_json::json!("Hi"));
    }

    #[test]
    fn empty_input_yields_no_blocks() {
        assert!(compile("").is_empty());
        assert!(compile("\n\n   \n").is_empty());
        assert_eq!(to_html(""), "");
    }
}
