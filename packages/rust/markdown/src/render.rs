//! Node tree to markup serializer.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::{Child, Node};

/// Serialize block nodes, one block per line.
pub fn render(blocks: &[Node]) -> String {
    let mut rendered = Vec::with_capacity(blocks.len());
    for block in blocks {
        let mut out = String::new();
        write_node(block, &mut out);
        rendered.push(out);
    }
    rendered.join("\n")
}

fn write_node(node: &Node, out: &mut String) {
    let name = node.tag.name();

    out.push('<');
    out.push_str(name);
    for attr in &node.attrs {
        if let Some(value) = &attr.value {
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            out.push_str(&escape_html(value));
            out.push('"');
        }
    }

    if node.tag.is_void() {
        out.push_str(" />");
        return;
    }
    out.push('>');

    for child in &node.children {
        match child {
            Child::Text(text) => out.push_str(&escape_html(text)),
            Child::Node(inner) => write_node(inner, out),
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Escape `&`, `<` and `>` in a single pass. Other characters pass through.
///
/// An `&` that already starts a character reference (`&name;`, `&#NN;`,
/// `&#xHH;`) is kept, so pre-escaped text is not escaped again.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);").expect("valid regex")
    });

    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for (i, c) in text.char_indices() {
        match c {
            '&' if ENTITY_RE.is_match(&text[i..]) => escaped.push('&'),
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tag;

    #[test]
    fn escape_only_touches_three_characters() {
        assert_eq!(escape_html("plain"), "plain");
        assert!(matches!(escape_html("plain"), Cow::Borrowed(_)));
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=\"x\"&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn existing_character_references_are_kept() {
        assert_eq!(escape_html("a &amp; b &lt;c&gt;"), "a &amp; b &lt;c&gt;");
        assert_eq!(escape_html("&#169; &#xA9; &copy;"), "&#169; &#xA9; &copy;");
        assert_eq!(escape_html("&#; &x; & amp; &amp"), "&amp;#; &x; &amp; amp; &amp;amp");
    }

    #[test]
    fn absent_attributes_are_omitted() {
        let node = Node::new(Tag::Pre)
            .with_attr("class", None)
            .with_attr("data-x", Some("1 < 2".into()))
            .with_text("x");
        assert_eq!(render(&[node]), "<pre data-x=\"1 &lt; 2\">x</pre>");
    }

    #[test]
    fn void_elements_self_close() {
        let hr = Node::new(Tag::HorizontalRule);
        assert_eq!(render(&[hr]), "<hr />");
    }

    #[test]
    fn nested_nodes_render_depth_first() {
        let code = Node::new(Tag::Code).with_text("let a = b && c;");
        let pre = Node::new(Tag::Pre)
            .with_attr("class", Some("language-rust".into()))
            .with_children(vec![Child::Node(code)]);
        assert_eq!(
            render(&[pre, Node::new(Tag::Paragraph).with_text("end")]),
            "<pre class=\"language-rust\"><code>let a = b &amp;&amp; c;</code></pre>\n<p>end</p>"
        );
    }
}
