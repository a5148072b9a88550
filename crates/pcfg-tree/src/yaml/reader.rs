//! Line-oriented reader for block-style YAML
//!
//! Records scalar styles, comments, flow layout and indentation so the
//! writer can reproduce untouched content. Constructs outside that subset
//! (anchors, aliases, tags, multi-line flow collections and plain scalars,
//! complex keys) give [`TreeError::Unsupported`].

use crate::document::Document;
use crate::error::{TreeError, TreeResult};
use crate::node::{BlockScalar, Mapping, Node, Scalar, ScalarStyle, ScalarTag, Sequence};

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    indent: usize,
    content: &'a str,
    comment: Option<&'a str>,
}

#[derive(Debug)]
enum RawLine<'a> {
    /// Blank (`""`) or comment-only line
    Trivia(String),
    Content(Line<'a>),
    /// Tab-indented line, an error unless it sits inside a block scalar
    Tabbed(usize),
}

struct Reader<'a> {
    text: Vec<&'a str>,
    lines: Vec<RawLine<'a>>,
    pos: usize,
    pending: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomp {
    Clip,
    Strip,
    Keep,
}

pub(super) fn read(text: &str) -> TreeResult<Document> {
    let mut reader = Reader {
        text: text.lines().collect(),
        lines: split_lines(text),
        pos: 0,
        pending: Vec::new(),
    };
    reader.document()
}

fn split_lines(text: &str) -> Vec<RawLine<'_>> {
    let mut lines = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let number = idx + 1;
        let body = raw.trim_start_matches(' ');
        let trimmed = body.trim_end();
        if trimmed.is_empty() {
            lines.push(RawLine::Trivia(String::new()));
        } else if body.starts_with('\t') {
            lines.push(RawLine::Tabbed(number));
        } else if trimmed.starts_with('#') {
            lines.push(RawLine::Trivia(trimmed.to_string()));
        } else {
            let (content, comment) = split_comment(trimmed);
            lines.push(RawLine::Content(Line {
                number,
                indent: raw.len() - body.len(),
                content,
                comment,
            }));
        }
    }
    lines
}

/// Split a trailing ` # comment` off a line, ignoring `#` inside quotes
fn split_comment(s: &str) -> (&str, Option<&str>) {
    let bytes = s.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') => {
                if b == b'\\' {
                    i += 1;
                } else if b == b'"' {
                    quote = None;
                }
            }
            Some(_) => {
                if b == b'\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        i += 1;
                    } else {
                        quote = None;
                    }
                }
            }
            None => {
                let after_space = i == 0 || bytes[i - 1] == b' ';
                if (b == b'"' || b == b'\'') && after_space {
                    quote = Some(b);
                } else if b == b'#' && i > 0 && bytes[i - 1] == b' ' {
                    return (s[..i].trim_end(), Some(&s[i..]));
                }
            }
        }
        i += 1;
    }
    (s, None)
}

impl<'a> Reader<'a> {
    /// Next content line, moving trivia in front of it to `pending`
    fn peek(&mut self) -> TreeResult<Option<Line<'a>>> {
        while let Some(raw) = self.lines.get(self.pos) {
            match raw {
                RawLine::Trivia(text) => {
                    self.pending.push(text.clone());
                    self.pos += 1;
                }
                RawLine::Content(line) => return Ok(Some(*line)),
                RawLine::Tabbed(number) => {
                    return Err(TreeError::unsupported(*number, "tab indentation"));
                }
            }
        }
        Ok(None)
    }

    fn take_pending(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn document(&mut self) -> TreeResult<Document> {
        let mut explicit_start = false;
        if let Some(line) = self.peek()? {
            if line.content == "---" && line.indent == 0 {
                explicit_start = true;
                self.advance();
            } else if line.content.starts_with("---") || line.content.starts_with("...") {
                return Err(TreeError::unsupported(line.number, "document marker"));
            }
        }

        let root = match self.peek()? {
            None => empty_null(),
            Some(line) if is_sequence_item(line.content) || split_key(line.content, line.number)?.is_some() => {
                self.block(line.indent)?
            }
            Some(line) if line.content.starts_with(['|', '>']) => {
                return Err(TreeError::unsupported(line.number, "block scalar at document root"));
            }
            Some(line) => {
                self.advance();
                let mut node = inline(line.content, line.number)?;
                node.comments_mut().head = self.take_pending();
                node.comments_mut().line = line.comment.map(str::to_string);
                node
            }
        };

        if let Some(line) = self.peek()? {
            return Err(TreeError::syntax(line.number, "unexpected content after document"));
        }
        Ok(Document {
            root,
            foot: self.take_pending(),
            explicit_start,
        })
    }

    fn block(&mut self, indent: usize) -> TreeResult<Node> {
        match self.peek()? {
            Some(line) if is_sequence_item(line.content) => self.sequence(indent),
            _ => self.mapping(indent),
        }
    }

    fn mapping(&mut self, indent: usize) -> TreeResult<Node> {
        let mut map = Mapping::new();
        while let Some(line) = self.peek()? {
            if line.indent < indent {
                break;
            }
            if line.indent > indent || is_sequence_item(line.content) {
                return Err(TreeError::syntax(line.number, "unexpected indentation"));
            }
            let Some((key, rest)) = split_key(line.content, line.number)? else {
                return Err(TreeError::unsupported(
                    line.number,
                    "scalar where a mapping entry was expected",
                ));
            };
            let head = self.take_pending();
            self.advance();
            let mut value = self.value(rest, line, indent, true)?;
            value.comments_mut().head = head;
            if map.contains_key(&key) {
                return Err(TreeError::syntax(line.number, format!("duplicate key '{key}'")));
            }
            map.insert(key, value);
        }
        Ok(Node::mapping(map))
    }

    fn sequence(&mut self, indent: usize) -> TreeResult<Node> {
        let mut items = Sequence::new();
        while let Some(line) = self.peek()? {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(TreeError::syntax(line.number, "unexpected indentation"));
            }
            if !is_sequence_item(line.content) {
                break;
            }
            let head = self.take_pending();
            let rest = line.content[1..].trim_start_matches(' ');
            let offset = line.content.len() - rest.len();
            let mut item = if rest.is_empty() {
                self.advance();
                self.value("", line, indent, false)?
            } else if is_sequence_item(rest) || split_key(rest, line.number)?.is_some() {
                // `- key: value` / `- - item`: reread the remainder as a
                // block starting at its own column.
                let nested = Line {
                    indent: line.indent + offset,
                    content: rest,
                    ..line
                };
                self.lines[self.pos] = RawLine::Content(nested);
                let mut node = self.block(nested.indent)?;
                node.set_indent(offset);
                node
            } else {
                self.advance();
                self.value(rest, line, indent, false)?
            };
            item.comments_mut().head = head;
            items.push(item);
        }
        Ok(Node::sequence(items))
    }

    /// Value following `key:` or `-` on `line`
    ///
    /// `indent` is the column of the key or of the `-`.
    fn value(
        &mut self,
        rest: &'a str,
        line: Line<'a>,
        indent: usize,
        in_mapping: bool,
    ) -> TreeResult<Node> {
        let mut node = if rest.is_empty() {
            match self.peek()? {
                Some(next) if next.indent > indent => {
                    let mut node = self.block(next.indent)?;
                    node.set_indent(next.indent - indent);
                    node
                }
                Some(next)
                    if in_mapping && next.indent == indent && is_sequence_item(next.content) =>
                {
                    let mut node = self.sequence(indent)?;
                    node.set_indent(0);
                    node
                }
                _ => empty_null(),
            }
        } else if rest.starts_with(['|', '>']) {
            self.block_scalar(rest, line.number, indent)?
        } else {
            inline(rest, line.number)?
        };
        node.comments_mut().line = line.comment.map(str::to_string);
        Ok(node)
    }

    /// Block scalar introduced by `header` on the line before `self.pos`
    ///
    /// Content lines are taken from the raw text, so comment-like and
    /// tab-indented lines inside the scalar are kept as text.
    fn block_scalar(&mut self, header: &str, number: usize, parent: usize) -> TreeResult<Node> {
        let mut indicators = header.chars();
        let style = match indicators.next() {
            Some('|') => ScalarStyle::Literal,
            _ => ScalarStyle::Folded,
        };
        let mut chomp = Chomp::Clip;
        let mut explicit = None;
        for c in indicators {
            match c {
                '-' if chomp == Chomp::Clip => chomp = Chomp::Strip,
                '+' if chomp == Chomp::Clip => chomp = Chomp::Keep,
                '1'..='9' if explicit.is_none() => {
                    explicit = c.to_digit(10).and_then(|d| usize::try_from(d).ok());
                }
                _ => return Err(TreeError::syntax(number, "invalid block scalar header")),
            }
        }

        let start = self.pos;
        let column = match explicit {
            Some(offset) => parent + offset,
            None => self.text[start..]
                .iter()
                .find(|raw| !raw.trim().is_empty())
                .map_or(0, |raw| leading_spaces(raw)),
        };
        let mut end = start;
        let mut text_end = start;
        while let Some(raw) = self.text.get(end) {
            if !raw.trim().is_empty() {
                if column <= parent || leading_spaces(raw) < column {
                    break;
                }
                text_end = end + 1;
            }
            end += 1;
        }
        if chomp != Chomp::Keep {
            end = text_end;
        }

        let lines: Vec<String> = self.text[start..end]
            .iter()
            .map(|raw| raw.get(column..).unwrap_or("").to_string())
            .collect();
        let value = block_value(style, chomp, &lines);
        self.pos = end;
        let block = BlockScalar {
            header: header.to_string(),
            offset: column.saturating_sub(parent).max(1),
            lines,
        };
        Ok(Node::scalar(Scalar::new(value, ScalarTag::Str, style).with_block(block)))
    }
}

fn leading_spaces(raw: &str) -> usize {
    raw.len() - raw.trim_start_matches(' ').len()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Value of a block scalar from its de-indented lines
fn block_value(style: ScalarStyle, chomp: Chomp, lines: &[String]) -> String {
    let text_len = lines.iter().rposition(|line| !is_blank(line)).map_or(0, |i| i + 1);
    let body = &lines[..text_len];
    let mut value = if style == ScalarStyle::Literal {
        body.join("\n")
    } else {
        fold(body)
    };
    if text_len > 0 && chomp != Chomp::Strip {
        value.push('\n');
    }
    if chomp == Chomp::Keep {
        value.extend(std::iter::repeat('\n').take(lines.len() - text_len));
    }
    value
}

/// Join folded lines: a single break between two text lines becomes a
/// space, blank lines become breaks, and more-indented lines keep theirs.
fn fold(lines: &[String]) -> String {
    let mut out = String::new();
    let mut previous: Option<bool> = None;
    let mut blanks = 0;
    for line in lines {
        if is_blank(line) {
            blanks += 1;
            continue;
        }
        let more_indented = line.starts_with([' ', '\t']);
        let breaks = match previous {
            None => blanks,
            Some(false) if !more_indented => {
                if blanks == 0 {
                    out.push(' ');
                }
                blanks
            }
            Some(_) => blanks + 1,
        };
        out.extend(std::iter::repeat('\n').take(breaks));
        out.push_str(line);
        previous = Some(more_indented);
        blanks = 0;
    }
    out
}

fn empty_null() -> Node {
    Node::scalar(Scalar::new("", ScalarTag::Null, ScalarStyle::Plain))
}

fn is_sequence_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

fn quoted_style(quote: char) -> ScalarStyle {
    if quote == '"' {
        ScalarStyle::DoubleQuoted
    } else {
        ScalarStyle::SingleQuoted
    }
}

/// Split `key: rest`, returning `None` when the content is not an entry
fn split_key(content: &str, number: usize) -> TreeResult<Option<(String, &str)>> {
    if content == "?" || content.starts_with("? ") {
        return Err(TreeError::unsupported(number, "complex mapping key"));
    }
    if content.starts_with(['"', '\'']) {
        let (key, used) = quoted(content, number)?;
        return Ok(match content[used..].strip_prefix(':') {
            Some(rest) if rest.is_empty() || rest.starts_with(' ') => {
                Some((key, rest.trim_start()))
            }
            _ => None,
        });
    }
    if content.starts_with(['[', '{']) {
        return Ok(None);
    }
    let bytes = content.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b':' && (i + 1 == bytes.len() || bytes[i + 1] == b' ') {
            let key = content[..i].trim_end();
            if key.is_empty() {
                return Ok(None);
            }
            if key.starts_with(['&', '*', '!']) || key == "<<" {
                return Err(TreeError::unsupported(number, format!("mapping key '{key}'")));
            }
            return Ok(Some((key.to_string(), content[i + 1..].trim_start())));
        }
    }
    Ok(None)
}

/// Parse a single-line value: scalar or flow collection
fn inline(text: &str, number: usize) -> TreeResult<Node> {
    match text {
        "[]" => return Ok(Node::sequence(Sequence::new())),
        "{}" => return Ok(Node::mapping(Mapping::new())),
        _ => {}
    }
    match text.chars().next() {
        Some('[' | '{') => Flow::parse(text, number),
        Some(quote @ ('"' | '\'')) => {
            let (value, used) = quoted(text, number)?;
            if used != text.len() {
                return Err(TreeError::syntax(number, "unexpected text after quoted scalar"));
            }
            Ok(Node::scalar(Scalar::new(value, ScalarTag::Str, quoted_style(quote))))
        }
        Some(c @ ('&' | '*' | '!' | '|' | '>' | '%' | '@' | '`')) => {
            Err(TreeError::unsupported(number, format!("'{c}' indicator")))
        }
        _ if text.contains(": ") || text.ends_with(':') => {
            Err(TreeError::syntax(number, "mapping value not allowed here"))
        }
        _ => Ok(Node::scalar(Scalar::plain(text))),
    }
}

/// Flow collection written on a single line
struct Flow<'t> {
    text: &'t str,
    pos: usize,
    number: usize,
}

impl<'t> Flow<'t> {
    fn parse(text: &'t str, number: usize) -> TreeResult<Node> {
        let mut flow = Self {
            text,
            pos: 0,
            number,
        };
        let node = flow.node()?;
        flow.skip_spaces();
        if flow.pos != text.len() {
            return Err(TreeError::syntax(number, "unexpected text after flow collection"));
        }
        Ok(node)
    }

    fn rest(&self) -> &'t str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_spaces(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start_matches(' ').len();
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn unclosed(&self) -> TreeError {
        TreeError::unsupported(self.number, "multi-line flow collection")
    }

    fn node(&mut self) -> TreeResult<Node> {
        self.skip_spaces();
        match self.peek() {
            Some('[') => self.sequence(),
            Some('{') => self.mapping(),
            Some(_) => Ok(Node::scalar(self.scalar()?)),
            None => Err(self.unclosed()),
        }
    }

    fn sequence(&mut self) -> TreeResult<Node> {
        self.eat('[');
        let mut items = Sequence::new();
        loop {
            self.skip_spaces();
            if self.eat(']') {
                break;
            }
            let item = self.node()?;
            self.skip_spaces();
            if self.peek() == Some(':') {
                return Err(TreeError::unsupported(self.number, "mapping entry in flow sequence"));
            }
            items.push(item);
            if !self.separator(']')? {
                break;
            }
        }
        Ok(Node::sequence(items).with_flow(true))
    }

    fn mapping(&mut self) -> TreeResult<Node> {
        self.eat('{');
        let mut map = Mapping::new();
        loop {
            self.skip_spaces();
            if self.eat('}') {
                break;
            }
            match self.peek() {
                None => return Err(self.unclosed()),
                Some('[' | '{') => {
                    return Err(TreeError::unsupported(self.number, "collection as mapping key"));
                }
                Some(_) => {}
            }
            let key = self.scalar()?.text().to_string();
            self.skip_spaces();
            let value = if self.eat(':') {
                self.skip_spaces();
                match self.peek() {
                    Some(',' | '}') => empty_null(),
                    _ => self.node()?,
                }
            } else {
                empty_null()
            };
            if map.contains_key(&key) {
                return Err(TreeError::syntax(self.number, format!("duplicate key '{key}'")));
            }
            map.insert(key, value);
            if !self.separator('}')? {
                break;
            }
        }
        Ok(Node::mapping(map).with_flow(true))
    }

    /// Consume `,` (returns true) or the closing bracket (returns false)
    fn separator(&mut self, close: char) -> TreeResult<bool> {
        self.skip_spaces();
        if self.eat(',') {
            Ok(true)
        } else if self.eat(close) {
            Ok(false)
        } else if self.peek().is_none() {
            Err(self.unclosed())
        } else {
            Err(TreeError::syntax(self.number, format!("expected ',' or '{close}'")))
        }
    }

    fn scalar(&mut self) -> TreeResult<Scalar> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let (value, used) = quoted(rest, self.number)?;
                self.pos += used;
                Ok(Scalar::new(value, ScalarTag::Str, quoted_style(quote)))
            }
            Some(c @ ('&' | '*' | '!' | '|' | '>' | '%' | '@' | '`')) => {
                Err(TreeError::unsupported(self.number, format!("'{c}' indicator")))
            }
            _ => {
                let len = plain_len(rest);
                let text = rest[..len].trim_end();
                if text.is_empty() {
                    return Err(TreeError::syntax(self.number, "expected a flow node"));
                }
                self.pos += len;
                Ok(Scalar::plain(text))
            }
        }
    }
}

/// Length of a plain scalar inside a flow collection
fn plain_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b',' | b'[' | b']' | b'{' | b'}' => break,
            b':' if matches!(
                bytes.get(i + 1),
                None | Some(b' ' | b',' | b'[' | b']' | b'{' | b'}')
            ) =>
            {
                break
            }
            _ => i += 1,
        }
    }
    i
}

/// Parse a quoted scalar at the start of `text`
///
/// Returns the unescaped value and the number of bytes consumed, closing
/// quote included.
fn quoted(text: &str, number: usize) -> TreeResult<(String, usize)> {
    let mut chars = text.char_indices();
    let Some((_, quote)) = chars.next() else {
        return Err(TreeError::syntax(number, "expected quoted scalar"));
    };
    let mut out = String::new();
    while let Some((i, c)) = chars.next() {
        if quote == '\'' {
            if c != '\'' {
                out.push(c);
            } else if text[i + 1..].starts_with('\'') {
                chars.next();
                out.push('\'');
            } else {
                return Ok((out, i + 1));
            }
            continue;
        }
        match c {
            '"' => return Ok((out, i + 1)),
            '\\' => {
                let Some((_, escape)) = chars.next() else {
                    return Err(TreeError::syntax(number, "unterminated escape"));
                };
                let unescaped = match escape {
                    'n' => '\n',
                    't' | '\t' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    'a' => '\x07',
                    'b' => '\x08',
                    'e' => '\x1b',
                    'f' => '\x0c',
                    'v' => '\x0b',
                    ' ' => ' ',
                    '"' => '"',
                    '/' => '/',
                    '\\' => '\\',
                    'N' => '\u{85}',
                    '_' => '\u{a0}',
                    'L' => '\u{2028}',
                    'P' => '\u{2029}',
                    'x' | 'u' | 'U' => {
                        let width = match escape {
                            'x' => 2,
                            'u' => 4,
                            _ => 8,
                        };
                        let digits: String = chars.by_ref().take(width).map(|(_, d)| d).collect();
                        if digits.len() != width {
                            return Err(TreeError::syntax(number, "truncated escape"));
                        }
                        u32::from_str_radix(&digits, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| {
                                TreeError::syntax(number, format!("invalid escape '\\{escape}{digits}'"))
                            })?
                    }
                    other => {
                        return Err(TreeError::syntax(number, format!("invalid escape '\\{other}'")));
                    }
                };
                out.push(unescaped);
            }
            _ => out.push(c),
        }
    }
    Err(TreeError::syntax(number, "unterminated quoted scalar"))
}
