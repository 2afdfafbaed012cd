//! Inline span scanner.
//!
//! At each position the scanner tries strong, emphasis, code span and link,
//! in that order. Span contents are kept as literal text. Anything that does
//! not open a span is consumed as plain text up to the next special character.

use crate::{Child, Node, Tag};

const SPECIALS: [char; 4] = ['*', '_', '`', '['];

/// Parse one span of text into inline children.
pub(crate) fn parse_inline(text: &str) -> Vec<Child> {
    let mut out = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];

        let matched = strong(rest)
            .or_else(|| emphasis(rest))
            .or_else(|| code_span(rest))
            .or_else(|| link(rest));

        if let Some((node, used)) = matched {
            out.push(Child::Node(node));
            pos += used;
            continue;
        }

        // A special character that opened nothing is literal. A run of the
        // same delimiter is taken whole so its tail can't open a span.
        let skip = match rest.chars().next() {
            Some(c @ ('*' | '_')) => rest.len() - rest.trim_start_matches(c).len(),
            Some(c) if SPECIALS.contains(&c) => c.len_utf8(),
            _ => 0,
        };
        let end = rest[skip..].find(SPECIALS).map_or(rest.len(), |i| i + skip);
        push_text(&mut out, &rest[..end]);
        pos += end;
    }

    out
}

fn push_text(out: &mut Vec<Child>, text: &str) {
    if text.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(Child::Text(prev)) => prev.push_str(text),
        _ => out.push(Child::Text(text.to_string())),
    }
}

/// `**text**` or `__text__`, closed by the nearest matching delimiter.
fn strong(rest: &str) -> Option<(Node, usize)> {
    for delim in ["**", "__"] {
        let Some(body) = rest.strip_prefix(delim) else {
            continue;
        };
        let close = body.find(delim)?;
        if close == 0 {
            return None;
        }
        let node = Node::new(Tag::Strong).with_text(&body[..close]);
        return Some((node, close + 2 * delim.len()));
    }
    None
}

/// `*text*` or `_text_` where neither delimiter is part of a doubled one.
fn emphasis(rest: &str) -> Option<(Node, usize)> {
    let delim = match rest.as_bytes().first()? {
        b'*' => b'*',
        b'_' => b'_',
        _ => return None,
    };
    let bytes = rest.as_bytes();
    if bytes.get(1) == Some(&delim) {
        return None;
    }

    let close = (2..bytes.len()).find(|&i| {
        bytes[i] == delim && bytes[i - 1] != delim && bytes.get(i + 1) != Some(&delim)
    })?;

    let node = Node::new(Tag::Emphasis).with_text(&rest[1..close]);
    Some((node, close + 1))
}

/// `` `code` ``; the first following backtick closes the span.
fn code_span(rest: &str) -> Option<(Node, usize)> {
    let body = rest.strip_prefix('`')?;
    let close = body.find('`')?;
    if close == 0 {
        return None;
    }
    let node = Node::new(Tag::Code).with_text(&body[..close]);
    Some((node, close + 2))
}

/// `[text](url)` with the `(` directly after the `]`.
fn link(rest: &str) -> Option<(Node, usize)> {
    let body = rest.strip_prefix('[')?;
    let close_text = body.find(']')?;
    let label = &body[..close_text];
    let after = body[close_text + 1..].strip_prefix('(')?;
    let close_url = after.find(')')?;
    let href = &after[..close_url];

    let node = Node::new(Tag::Link)
        .with_attr("href", Some(href.to_string()))
        .with_text(label);
    // '[' + label + ']' + '(' + href + ')'
    Some((node, label.len() + href.len() + 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Child {
        Child::Text(s.to_string())
    }

    fn node(tag: Tag, inner: &str) -> Child {
        Child::Node(Node::new(tag).with_text(inner))
    }

    #[test]
    fn strong_is_non_greedy_and_literal() {
        assert_eq!(parse_inline("**a*b*c**"), vec![node(Tag::Strong, "a*b*c")]);
        assert_eq!(
            parse_inline("**a** and **b**"),
            vec![node(Tag::Strong, "a"), text(" and "), node(Tag::Strong, "b")]
        );
        assert_eq!(parse_inline("__u__"), vec![node(Tag::Strong, "u")]);
    }

    #[test]
    fn emphasis_with_both_delimiters() {
        assert_eq!(
            parse_inline("an *em* and _em_"),
            vec![
                text("an "),
                node(Tag::Emphasis, "em"),
                text(" and "),
                node(Tag::Emphasis, "em"),
            ]
        );
    }

    #[test]
    fn emphasis_skips_doubled_closers() {
        assert_eq!(
            parse_inline("*a**b*"),
            vec![node(Tag::Emphasis, "a**b")]
        );
    }

    #[test]
    fn unmatched_delimiters_are_text() {
        assert_eq!(parse_inline("2 * 3 = 6"), vec![text("2 * 3 = 6")]);
        assert_eq!(parse_inline("**open"), vec![text("**open")]);
        assert_eq!(parse_inline("snake_case"), vec![text("snake_case")]);
        assert_eq!(parse_inline("`tick"), vec![text("`tick")]);
        assert_eq!(parse_inline("[a] (b)"), vec![text("[a] (b)")]);
    }

    #[test]
    fn code_span_is_literal() {
        assert_eq!(
            parse_inline("run `cargo *build*` now"),
            vec![text("run "), node(Tag::Code, "cargo *build*"), text(" now")]
        );
    }

    #[test]
    fn link_carries_href() {
        let out = parse_inline("see [the docs](https://example.com/a_b) here");
        assert_eq!(out.len(), 3);
        let Child::Node(link) = &out[1] else {
            panic!("expected link node");
        };
        assert_eq!(link.tag, Tag::Link);
        assert_eq!(link.attr("href"), Some("https://example.com/a_b"));
        assert_eq!(link.text_content(), "the docs");
        assert_eq!(out[2], text(" here"));
    }

    #[test]
    fn multibyte_text_is_preserved() {
        assert_eq!(
            parse_inline("café *naïve* – ok"),
            vec![text("café "), node(Tag::Emphasis, "naïve"), text(" – ok")]
        );
    }
}
