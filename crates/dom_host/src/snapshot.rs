//! Readable tree dumps for assertions.

use html::{Document, NodeId, NodeKind};
use std::fmt::Write;

/// One line per node under `root` (exclusive), indented by depth.
pub fn outline(doc: &Document, root: NodeId) -> Vec<String> {
    let mut lines = Vec::new();
    for child in doc.children(root) {
        outline_into(doc, *child, 0, &mut lines);
    }
    lines
}

fn outline_into(doc: &Document, node: NodeId, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let line = match doc.kind(node) {
        Some(NodeKind::Element { name, attributes }) => {
            let mut line = format!("{indent}<{name}");
            for (key, value) in attributes {
                let _ = write!(&mut line, " {key}=\"{value}\"");
            }
            line.push('>');
            line
        }
        Some(NodeKind::Text(text)) => format!("{indent}\"{}\"", text.escape_debug()),
        Some(NodeKind::Comment(text)) => format!("{indent}<!-- {text} -->"),
        Some(NodeKind::Document) | None => return,
    };
    lines.push(line);
    for child in doc.children(node) {
        outline_into(doc, *child, depth + 1, lines);
    }
}

/// Describes the first differing line with a little context, or returns an
/// empty string when both sides match.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let max = expected.len().max(actual.len());
    let Some(i) = (0..max).find(|i| at(expected, *i) != at(actual, *i)) else {
        return String::new();
    };
    let mut out = String::new();
    let start = i.saturating_sub(2);
    let end = (i + 3).min(max);
    let _ = writeln!(&mut out, "first mismatch at line {} (showing {}..={}):", i + 1, start + 1, end);
    for line in start..end {
        let marker = if line == i { ">" } else { " " };
        let _ = writeln!(&mut out, "{marker} {:>4}  expected: {}", line + 1, at(expected, line));
        let _ = writeln!(&mut out, "{marker} {:>4}    actual: {}", line + 1, at(actual, line));
    }
    out
}

fn at(lines: &[String], i: usize) -> &str {
    lines.get(i).map_or("<missing>", String::as_str)
}
