//! Line-cursor block scanner.
//!
//! Each non-blank line is classified once, in precedence order, and the
//! matching block consumes as many following lines as it can.

use std::sync::LazyLock;

use regex::Regex;

use crate::inline::parse_inline;
use crate::{Child, Node, Tag};

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6}) (.+)$").expect("valid regex"));

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*] (.*)$").expect("valid regex"));

static NUMBERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\. (.*)$").expect("valid regex"));

const FENCE: &str = "```";

/// What a single trimmed line starts.
#[derive(Debug, PartialEq)]
enum LineKind<'a> {
    Blank,
    Fence(&'a str),
    Heading(u8, &'a str),
    Rule,
    Quote(&'a str),
    Bullet(&'a str),
    Numbered(&'a str),
    Text(&'a str),
}

fn classify(line: &str) -> LineKind<'_> {
    let line = line.trim();

    if line.is_empty() {
        return LineKind::Blank;
    }
    if let Some(lang) = line.strip_prefix(FENCE) {
        return LineKind::Fence(lang.trim());
    }
    if let Some(caps) = HEADING_RE.captures(line) {
        let level = caps.get(1).map_or(1, |m| m.as_str().len()) as u8;
        let text = caps.get(2).map_or("", |m| m.as_str());
        return LineKind::Heading(level, text.trim());
    }
    if is_rule(line) {
        return LineKind::Rule;
    }
    if let Some(rest) = line.strip_prefix('>') {
        return LineKind::Quote(rest.trim());
    }
    if let Some(caps) = BULLET_RE.captures(line) {
        return LineKind::Bullet(caps.get(1).map_or("", |m| m.as_str()).trim());
    }
    if let Some(caps) = NUMBERED_RE.captures(line) {
        return LineKind::Numbered(caps.get(1).map_or("", |m| m.as_str()).trim());
    }
    LineKind::Text(line)
}

/// Three or more of the same `-`, `*` or `_` and nothing else.
fn is_rule(line: &str) -> bool {
    let mut chars = line.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_') && line.len() >= 3 && chars.all(|c| c == first)
}

/// Scan `input` into top-level block nodes.
pub(crate) fn parse_blocks(input: &str) -> Vec<Node> {
    let lines: Vec<&str> = input.lines().collect();
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while cursor < lines.len() {
        match classify(lines[cursor]) {
            LineKind::Blank => cursor += 1,
            LineKind::Fence(lang) => {
                let (node, next) = fenced_block(&lines, cursor + 1, lang);
                blocks.push(node);
                cursor = next;
            }
            LineKind::Heading(level, text) => {
                blocks.push(Node::new(Tag::Heading(level)).with_children(parse_inline(text)));
                cursor += 1;
            }
            LineKind::Rule => {
                blocks.push(Node::new(Tag::HorizontalRule));
                cursor += 1;
            }
            LineKind::Quote(_) => {
                let (parts, next) = take_while(&lines, cursor, |kind| match kind {
                    LineKind::Quote(text) => Some(text),
                    _ => None,
                });
                let joined = join_nonempty(&parts);
                blocks.push(Node::new(Tag::Blockquote).with_children(parse_inline(&joined)));
                cursor = next;
            }
            LineKind::Bullet(_) => {
                let (items, next) = take_while(&lines, cursor, |kind| match kind {
                    LineKind::Bullet(text) => Some(text),
                    _ => None,
                });
                blocks.push(list(Tag::UnorderedList, &items));
                cursor = next;
            }
            LineKind::Numbered(_) => {
                let (items, next) = take_while(&lines, cursor, |kind| match kind {
                    LineKind::Numbered(text) => Some(text),
                    _ => None,
                });
                blocks.push(list(Tag::OrderedList, &items));
                cursor = next;
            }
            LineKind::Text(_) => {
                let (parts, next) = take_while(&lines, cursor, |kind| match kind {
                    LineKind::Text(text) => Some(text),
                    _ => None,
                });
                let joined = parts.join(" ");
                blocks.push(Node::new(Tag::Paragraph).with_children(parse_inline(&joined)));
                cursor = next;
            }
        }
    }

    blocks
}

/// Collect the payload of consecutive lines accepted by `accept`, starting at
/// `start`. Returns the payloads and the index of the first rejected line.
fn take_while<'a>(
    lines: &[&'a str],
    start: usize,
    accept: impl Fn(LineKind<'a>) -> Option<&'a str>,
) -> (Vec<&'a str>, usize) {
    let mut parts = Vec::new();
    let mut cursor = start;
    while let Some(&line) = lines.get(cursor) {
        match accept(classify(line)) {
            Some(text) => parts.push(text),
            None => break,
        }
        cursor += 1;
    }
    (parts, cursor)
}

fn join_nonempty(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn list(tag: Tag, items: &[&str]) -> Node {
    let children = items
        .iter()
        .map(|text| Child::Node(Node::new(Tag::ListItem).with_children(parse_inline(text))))
        .collect();
    Node::new(tag).with_children(children)
}

/// Body lines run until the closing fence or end of input. `start` is the
/// first line after the opening fence.
fn fenced_block(lines: &[&str], start: usize, lang: &str) -> (Node, usize) {
    let mut body = Vec::new();
    let mut cursor = start;
    let mut closed = false;

    while let Some(&line) = lines.get(cursor) {
        cursor += 1;
        if line.trim().starts_with(FENCE) {
            closed = true;
            break;
        }
        body.push(line);
    }

    if !closed {
        tracing::debug!(line = start, "unterminated code fence, closing at end of input");
    }

    let class = (!lang.is_empty()).then(|| format!("language-{lang}"));
    let code = Node::new(Tag::Code).with_text(body.join("\n"));
    let node = Node::new(Tag::Pre)
        .with_attr("class", class)
        .with_children(vec![Child::Node(code)]);
    (node, cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Child {
        Child::Text(s.to_string())
    }

    #[test]
    fn classify_precedence() {
        assert_eq!(classify("```rust"), LineKind::Fence("rust"));
        assert_eq!(classify("### Setup"), LineKind::Heading(3, "Setup"));
        assert_eq!(classify("---"), LineKind::Rule);
        assert_eq!(classify("***"), LineKind::Rule);
        assert_eq!(classify("___"), LineKind::Rule);
        assert_eq!(classify("> hi"), LineKind::Quote("hi"));
        assert_eq!(classify("- item"), LineKind::Bullet("item"));
        assert_eq!(classify("* item"), LineKind::Bullet("item"));
        assert_eq!(classify("12. item"), LineKind::Numbered("item"));
        assert_eq!(classify("plain"), LineKind::Text("plain"));
    }

    #[test]
    fn near_misses_fall_back_to_text() {
        assert_eq!(classify("####### seven"), LineKind::Text("####### seven"));
        assert_eq!(classify("#nospace"), LineKind::Text("#nospace"));
        assert_eq!(classify("--"), LineKind::Text("--"));
        assert_eq!(classify("-*-"), LineKind::Text("-*-"));
        assert_eq!(classify("-item"), LineKind::Text("-item"));
        assert_eq!(classify("1.item"), LineKind::Text("1.item"));
    }

    #[test]
    fn fenced_block_keeps_language_and_indentation() {
        let blocks = parse_blocks("```rust\nfn main() {\n    run();\n}\n```\nafter");
        assert_eq!(blocks.len(), 2);

        let pre = &blocks[0];
        assert_eq!(pre.tag, Tag::Pre);
        assert_eq!(pre.attr("class"), Some("language-rust"));
        assert_eq!(pre.text_content(), "fn main() {\n    run();\n}");
        assert_eq!(blocks[1].tag, Tag::Paragraph);
    }

    #[test]
    fn fence_contents_are_not_parsed() {
        let blocks = parse_blocks("```\n# not a heading\n**not bold**\n```");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].attr("class"), None);
        assert_eq!(blocks[0].text_content(), "# not a heading\n**not bold**");
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        let blocks = parse_blocks("intro\n\n```sh\necho one\necho two");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].text_content(), "echo one\necho two");
    }

    #[test]
    fn paragraph_lines_join_with_spaces() {
        let blocks = parse_blocks("first line\nsecond line\n\nnext para");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].children, vec![text("first line second line")]);
        assert_eq!(blocks[1].children, vec![text("next para")]);
    }

    #[test]
    fn paragraph_stops_at_other_block() {
        let blocks = parse_blocks("some text\n# Heading\n- item");
        let tags: Vec<Tag> = blocks.iter().map(|b| b.tag).collect();
        assert_eq!(tags, vec![Tag::Paragraph, Tag::Heading(1), Tag::UnorderedList]);
    }

    #[test]
    fn blockquote_strips_markers() {
        let blocks = parse_blocks(">one\n> two\n>\n> three");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].tag, Tag::Blockquote);
        assert_eq!(blocks[0].children, vec![text("one two three")]);
    }

    #[test]
    fn lists_emit_one_item_per_line() {
        let blocks = parse_blocks("1. first\n2. *second*\n3. third\n- bullet");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].tag, Tag::OrderedList);
        assert_eq!(blocks[0].children.len(), 3);
        assert_eq!(blocks[1].tag, Tag::UnorderedList);

        let Child::Node(second) = &blocks[0].children[1] else {
            panic!("expected list item node");
        };
        assert!(matches!(&second.children[0], Child::Node(n) if n.tag == Tag::Emphasis));
    }

    #[test]
    fn mixed_bullet_markers_share_a_list() {
        let blocks = parse_blocks("- a\n* b");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].children.len(), 2);
    }
}
