//! YAML writer
//!
//! Nested blocks keep the indentation they were read with; new ones get two
//! spaces, with sequences indented under their key. Mapping items are written
//! compact (`- key: value`). Flow collections stay on one line while their
//! content fits there. Scalars keep their recorded style unless it would
//! change the value on the next read.

use crate::document::Document;
use crate::node::{
    is_plain_safe, Mapping, Node, NodeValue, Scalar, ScalarStyle, ScalarTag, Sequence,
};

const INDENT: usize = 2;

pub(super) fn write(doc: &Document) -> String {
    let mut out = String::new();
    if doc.explicit_start {
        out.push_str("---\n");
    }
    let root = &doc.root;
    head(&root.comments().head, 0, &mut out);
    match root.value() {
        _ if flow_fits(root) => {
            out.push_str(&flow(root));
            line_comment(root, true, &mut out);
            out.push('\n');
        }
        NodeValue::Mapping(m) if !m.is_empty() => mapping(m, 0, &mut out),
        NodeValue::Sequence(s) if !s.is_empty() => sequence(s, 0, &mut out),
        _ => {
            let text = inline(root);
            out.push_str(&text);
            line_comment(root, !text.is_empty(), &mut out);
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
        }
    }
    head(&doc.foot, 0, &mut out);
    out
}

fn pad(indent: usize, out: &mut String) {
    out.extend(std::iter::repeat(' ').take(indent));
}

fn head(lines: &[String], indent: usize, out: &mut String) {
    for line in lines {
        if !line.is_empty() {
            pad(indent, out);
            out.push_str(line);
        }
        out.push('\n');
    }
}

fn line_comment(node: &Node, space: bool, out: &mut String) {
    if let Some(comment) = &node.comments().line {
        if space {
            out.push(' ');
        }
        out.push_str(comment);
    }
}

fn mapping(map: &Mapping, indent: usize, out: &mut String) {
    for (key, value) in map {
        entry(key, value, indent, true, out);
    }
}

/// Write `key: value`; `padded` is false when the line was already started
/// by a sequence indicator.
fn entry(key: &str, value: &Node, indent: usize, padded: bool, out: &mut String) {
    if padded {
        head(&value.comments().head, indent, out);
        pad(indent, out);
    }
    out.push_str(&key_text(key));
    out.push(':');
    after_indicator(value, indent, true, out);
}

fn sequence(items: &Sequence, indent: usize, out: &mut String) {
    for item in items {
        head(&item.comments().head, indent, out);
        pad(indent, out);
        out.push('-');
        match item.value() {
            NodeValue::Mapping(m) if !flow_fits(item) && compact(item, m) => {
                let offset = item.indent().filter(|&o| o >= 2).unwrap_or(INDENT);
                pad(offset - 1, out);
                let mut entries = m.iter();
                if let Some((key, value)) = entries.next() {
                    entry(key, value, indent + offset, false, out);
                }
                for (key, value) in entries {
                    entry(key, value, indent + offset, true, out);
                }
            }
            _ => after_indicator(item, indent, false, out),
        }
    }
}

/// Whether a mapping item can start on the `-` line
fn compact(item: &Node, map: &Mapping) -> bool {
    item.comments().line.is_none()
        && map
            .first()
            .is_some_and(|(_, value)| value.comments().head.is_empty())
}

/// Column offset of a nested block
///
/// Only a sequence under a mapping key may start at the key's own column.
fn nested_offset(node: &Node, at_key_column: bool) -> usize {
    node.indent()
        .filter(|&o| o > 0 || at_key_column)
        .unwrap_or(INDENT)
}

/// Rest of a line after `key:` or `-`, plus any nested block
///
/// `indent` is the column of the key or of the `-`.
fn after_indicator(node: &Node, indent: usize, in_mapping: bool, out: &mut String) {
    match node.value() {
        _ if flow_fits(node) => {
            out.push(' ');
            out.push_str(&flow(node));
            line_comment(node, true, out);
            out.push('\n');
        }
        NodeValue::Mapping(m) if !m.is_empty() => {
            line_comment(node, true, out);
            out.push('\n');
            mapping(m, indent + nested_offset(node, false), out);
        }
        NodeValue::Sequence(s) if !s.is_empty() => {
            line_comment(node, true, out);
            out.push('\n');
            sequence(s, indent + nested_offset(node, in_mapping), out);
        }
        NodeValue::Scalar(s) if s.block().is_some() => block_scalar(node, s, indent, out),
        _ => {
            let text = inline(node);
            if !text.is_empty() {
                out.push(' ');
                out.push_str(&text);
            }
            line_comment(node, true, out);
            out.push('\n');
        }
    }
}

fn block_scalar(node: &Node, s: &Scalar, indent: usize, out: &mut String) {
    let Some(block) = s.block() else {
        return;
    };
    out.push(' ');
    out.push_str(&block.header);
    line_comment(node, true, out);
    out.push('\n');
    for line in &block.lines {
        if !line.is_empty() {
            pad(indent + block.offset, out);
            out.push_str(line);
        }
        out.push('\n');
    }
}

/// Whether a flow collection can still be written on one line
fn flow_fits(node: &Node) -> bool {
    fn fits(node: &Node) -> bool {
        node.comments().is_empty()
            && match node.value() {
                NodeValue::Scalar(_) => true,
                NodeValue::Mapping(m) => m.values().all(fits),
                NodeValue::Sequence(s) => s.iter().all(fits),
            }
    }
    node.is_flow()
        && match node.value() {
            NodeValue::Scalar(_) => false,
            NodeValue::Mapping(m) => !m.is_empty() && m.values().all(fits),
            NodeValue::Sequence(s) => !s.is_empty() && s.iter().all(fits),
        }
}

fn flow(node: &Node) -> String {
    match node.value() {
        NodeValue::Scalar(s) => flow_scalar(s),
        NodeValue::Sequence(items) => {
            let items: Vec<String> = items.iter().map(flow).collect();
            format!("[{}]", items.join(", "))
        }
        NodeValue::Mapping(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, value)| {
                    let key = flow_scalar(&Scalar::string(key.as_str()));
                    match value.as_scalar() {
                        Some(s) if s.is_null() && s.text().is_empty() => key,
                        _ => format!("{key}: {}", flow(value)),
                    }
                })
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Scalar inside a flow collection, where `,[]{}` end a plain scalar
fn flow_scalar(s: &Scalar) -> String {
    let text = scalar(s);
    if text == s.text() && s.text().contains([',', '[', ']', '{', '}']) {
        if s.text().chars().any(char::is_control) {
            double_quoted(s.text())
        } else {
            single_quoted(s.text())
        }
    } else {
        text
    }
}

fn inline(node: &Node) -> String {
    match node.value() {
        NodeValue::Scalar(s) => scalar(s),
        NodeValue::Mapping(_) => "{}".to_string(),
        NodeValue::Sequence(_) => "[]".to_string(),
    }
}

fn scalar(s: &Scalar) -> String {
    let text = s.text();
    let has_control = text.chars().any(char::is_control);
    match s.style() {
        ScalarStyle::Plain if s.tag() != ScalarTag::Str || is_plain_safe(text) => text.to_string(),
        ScalarStyle::Plain | ScalarStyle::SingleQuoted if !has_control => single_quoted(text),
        _ => double_quoted(text),
    }
}

fn key_text(key: &str) -> String {
    if is_plain_safe(key) {
        key.to_string()
    } else {
        scalar(&Scalar::string(key))
    }
}

fn single_quoted(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
