//! Document tree nodes
//!
//! Provides [`Node`], a tagged tree element that carries the formatting hints
//! (scalar style, flow or block layout, indentation, comments) needed to
//! re-emit untouched content unchanged.

use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Ordered mapping with unique string keys
///
/// Insertion order is the document order of the keys.
pub type Mapping = IndexMap<String, Node>;

/// Ordered list of nodes
pub type Sequence = Vec<Node>;

/// Kind of a [`Node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Leaf value
    Scalar,
    /// Keyed children
    Mapping,
    /// Ordered children
    Sequence,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scalar => "scalar",
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
        };
        f.write_str(name)
    }
}

/// Resolved type of a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarTag {
    /// `null`, `~` or nothing at all
    Null,
    /// `true` / `false`
    Bool,
    /// Integer literal
    Int,
    /// Floating point literal
    Float,
    /// Anything else
    Str,
}

static INT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-+]?[0-9]+|0o[0-7]+|0x[0-9a-fA-F]+)$").expect("valid regex"));

static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-+]?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?)(?:[eE][-+]?[0-9]+)?|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$")
        .expect("valid regex")
});

impl ScalarTag {
    /// Resolve the tag of a plain (unquoted) scalar
    ///
    /// Follows the YAML 1.2 core schema.
    #[must_use]
    pub fn resolve(text: &str) -> Self {
        match text {
            "" | "~" | "null" | "Null" | "NULL" => Self::Null,
            "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => Self::Bool,
            _ if INT_RE.is_match(text) => Self::Int,
            _ if FLOAT_RE.is_match(text) => Self::Float,
            _ => Self::Str,
        }
    }
}

/// Presentation style of a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScalarStyle {
    /// Unquoted
    #[default]
    Plain,
    /// `'text'`
    SingleQuoted,
    /// `"text"`
    DoubleQuoted,
    /// `|` block scalar
    Literal,
    /// `>` block scalar
    Folded,
}

/// Source lines of a block scalar as they were read
///
/// Block scalars are re-emitted from these lines rather than from the folded
/// value, so chomping, folding and trailing spaces come out as they went in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BlockScalar {
    /// Indicator with chomping and indentation hints, e.g. `|-` or `>2`
    pub(crate) header: String,
    /// Content column relative to the parent's column
    pub(crate) offset: usize,
    /// Content lines with the indentation removed
    pub(crate) lines: Vec<String>,
}

/// Leaf value together with its formatting hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    text: String,
    tag: ScalarTag,
    style: ScalarStyle,
    block: Option<BlockScalar>,
}

impl Scalar {
    /// Create scalar from its parts
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>, tag: ScalarTag, style: ScalarStyle) -> Self {
        Self {
            text: text.into(),
            tag,
            style,
            block: None,
        }
    }

    /// Attach the source lines of a block scalar
    pub(crate) fn with_block(mut self, block: BlockScalar) -> Self {
        self.block = Some(block);
        self
    }

    /// Source lines, for block scalars that came from a reader
    #[inline]
    pub(crate) fn block(&self) -> Option<&BlockScalar> {
        self.block.as_ref()
    }

    /// Plain scalar whose tag is resolved from the text
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        let tag = ScalarTag::resolve(&text);
        Self::new(text, tag, ScalarStyle::Plain)
    }

    /// String scalar, quoted only when a plain rendering would change its type
    #[must_use]
    pub fn string(text: impl Into<String>) -> Self {
        let text = text.into();
        let style = if is_plain_safe(&text) {
            ScalarStyle::Plain
        } else {
            quoted_style_for(&text)
        };
        Self::new(text, ScalarTag::Str, style)
    }

    /// `null`
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self::new("null", ScalarTag::Null, ScalarStyle::Plain)
    }

    /// Boolean scalar
    #[inline]
    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::new(value.to_string(), ScalarTag::Bool, ScalarStyle::Plain)
    }

    /// Integer scalar
    #[inline]
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::new(value.to_string(), ScalarTag::Int, ScalarStyle::Plain)
    }

    /// Source text (unquoted, unescaped)
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Resolved tag
    #[inline]
    #[must_use]
    pub fn tag(&self) -> ScalarTag {
        self.tag
    }

    /// Presentation style
    #[inline]
    #[must_use]
    pub fn style(&self) -> ScalarStyle {
        self.style
    }

    /// String value, if this is a string scalar
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        (self.tag == ScalarTag::Str).then_some(self.text.as_str())
    }

    /// Boolean value, if this is a boolean scalar
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        if self.tag != ScalarTag::Bool {
            return None;
        }
        Some(self.text.eq_ignore_ascii_case("true"))
    }

    /// Check for `null`
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.tag == ScalarTag::Null
    }

    /// Compare values, ignoring presentation
    ///
    /// `8080` equals `8080` whatever the quoting, `True` equals `true`,
    /// and every spelling of null equals every other.
    #[must_use]
    pub fn same_value(&self, other: &Self) -> bool {
        if self.tag != other.tag {
            return false;
        }
        match self.tag {
            ScalarTag::Null => true,
            ScalarTag::Bool => self.as_bool() == other.as_bool(),
            ScalarTag::Float => match (self.text.parse::<f64>(), other.text.parse::<f64>()) {
                (Ok(a), Ok(b)) => a == b,
                _ => self.text == other.text,
            },
            ScalarTag::Int | ScalarTag::Str => self.text == other.text,
        }
    }
}

/// Check whether a string can be written unquoted and still read back as
/// the same string
#[must_use]
pub fn is_plain_safe(text: &str) -> bool {
    if text.is_empty() || text.trim() != text {
        return false;
    }
    if ScalarTag::resolve(text) != ScalarTag::Str {
        return false;
    }
    if text.chars().any(char::is_control) {
        return false;
    }
    if text.contains(": ") || text.contains(" #") || text.ends_with(':') {
        return false;
    }
    let mut chars = text.chars();
    match chars.next() {
        Some('-' | '?' | ':') => !matches!(chars.next(), None | Some(' ' | '-')),
        Some(
            ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%'
            | '@' | '`',
        ) => false,
        _ => true,
    }
}

fn quoted_style_for(text: &str) -> ScalarStyle {
    if text.chars().any(char::is_control) {
        ScalarStyle::DoubleQuoted
    } else {
        ScalarStyle::SingleQuoted
    }
}

/// Comments attached to a node
///
/// `head` holds the lines written above the node (`""` for a blank line,
/// `"# text"` for a comment), `line` the trailing comment on the node's
/// own line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    /// Lines above the node
    pub head: Vec<String>,
    /// Trailing comment, including the leading `#`
    pub line: Option<String>,
}

impl Comments {
    /// Check whether no comment is attached
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_empty() && self.line.is_none()
    }
}

/// Payload of a [`Node`]
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// Leaf value
    Scalar(Scalar),
    /// Keyed children
    Mapping(Mapping),
    /// Ordered children
    Sequence(Sequence),
}

/// One element of a document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    value: NodeValue,
    comments: Comments,
    flow: bool,
    indent: Option<usize>,
}

impl Node {
    /// Create node without comments
    #[inline]
    #[must_use]
    pub fn new(value: NodeValue) -> Self {
        Self {
            value,
            comments: Comments::default(),
            flow: false,
            indent: None,
        }
    }

    /// Scalar node
    #[inline]
    #[must_use]
    pub fn scalar(scalar: Scalar) -> Self {
        Self::new(NodeValue::Scalar(scalar))
    }

    /// Mapping node
    #[inline]
    #[must_use]
    pub fn mapping(mapping: Mapping) -> Self {
        Self::new(NodeValue::Mapping(mapping))
    }

    /// Sequence node
    #[inline]
    #[must_use]
    pub fn sequence(items: Sequence) -> Self {
        Self::new(NodeValue::Sequence(items))
    }

    /// `null` scalar node
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self::scalar(Scalar::null())
    }

    /// String scalar node
    #[inline]
    #[must_use]
    pub fn string(text: impl Into<String>) -> Self {
        Self::scalar(Scalar::string(text))
    }

    /// Empty node of the given kind (`null` for scalars)
    #[must_use]
    pub fn empty(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Scalar => Self::null(),
            NodeKind::Mapping => Self::mapping(Mapping::new()),
            NodeKind::Sequence => Self::sequence(Sequence::new()),
        }
    }

    /// Kind of this node
    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self.value {
            NodeValue::Scalar(_) => NodeKind::Scalar,
            NodeValue::Mapping(_) => NodeKind::Mapping,
            NodeValue::Sequence(_) => NodeKind::Sequence,
        }
    }

    /// Payload
    #[inline]
    #[must_use]
    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    /// Mutable payload
    #[inline]
    pub fn value_mut(&mut self) -> &mut NodeValue {
        &mut self.value
    }

    /// Consume the node, returning its payload
    #[inline]
    #[must_use]
    pub fn into_value(self) -> NodeValue {
        self.value
    }

    /// Replace the payload, keeping the comments
    #[inline]
    pub fn set_value(&mut self, value: NodeValue) {
        self.value = value;
    }

    /// Attached comments
    #[inline]
    #[must_use]
    pub fn comments(&self) -> &Comments {
        &self.comments
    }

    /// Mutable attached comments
    #[inline]
    pub fn comments_mut(&mut self) -> &mut Comments {
        &mut self.comments
    }

    /// Set comments, returning the node
    #[inline]
    #[must_use]
    pub fn with_comments(mut self, comments: Comments) -> Self {
        self.comments = comments;
        self
    }

    /// Whether the collection was written in flow style (`[a, b]`, `{a: 1}`)
    #[inline]
    #[must_use]
    pub fn is_flow(&self) -> bool {
        self.flow
    }

    /// Mark the collection for flow style, returning the node
    ///
    /// The writer falls back to block style when the content cannot be
    /// written on one line.
    #[inline]
    #[must_use]
    pub fn with_flow(mut self, flow: bool) -> Self {
        self.flow = flow;
        self
    }

    /// Column of a nested block relative to the line that introduced it
    ///
    /// `None` for nodes that were not read from text; the writer then uses
    /// its default.
    #[inline]
    pub(crate) fn indent(&self) -> Option<usize> {
        self.indent
    }

    #[inline]
    pub(crate) fn set_indent(&mut self, offset: usize) {
        self.indent = Some(offset);
    }

    /// Scalar payload
    #[inline]
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.value {
            NodeValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Mapping payload
    #[inline]
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match &self.value {
            NodeValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Mutable mapping payload
    #[inline]
    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match &mut self.value {
            NodeValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Sequence payload
    #[inline]
    #[must_use]
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match &self.value {
            NodeValue::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable sequence payload
    #[inline]
    pub fn as_sequence_mut(&mut self) -> Option<&mut Sequence> {
        match &mut self.value {
            NodeValue::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Check for a `null` scalar
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.as_scalar().is_some_and(Scalar::is_null)
    }

    /// Child of a mapping node
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?.get(key)
    }

    /// Mutable child of a mapping node
    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.as_mapping_mut()?.get_mut(key)
    }

    /// String value of a mapping child
    #[inline]
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_scalar()?.as_str()
    }

    /// Text of a non-null scalar mapping child, whatever its tag
    ///
    /// `name: 8080` and `name: '8080'` both give `"8080"`.
    #[inline]
    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<&str> {
        let scalar = self.get(key)?.as_scalar()?;
        (!scalar.is_null()).then_some(scalar.text())
    }

    /// Structural equality ignoring comments, styles and mapping key order
    #[must_use]
    pub fn same_content(&self, other: &Node) -> bool {
        match (&self.value, &other.value) {
            (NodeValue::Scalar(a), NodeValue::Scalar(b)) => a.same_value(b),
            (NodeValue::Mapping(a), NodeValue::Mapping(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|o| v.same_content(o)))
            }
            (NodeValue::Sequence(a), NodeValue::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_content(y))
            }
            _ => false,
        }
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Self::scalar(scalar)
    }
}

impl From<Mapping> for Node {
    fn from(mapping: Mapping) -> Self {
        Self::mapping(mapping)
    }
}

impl From<Sequence> for Node {
    fn from(items: Sequence) -> Self {
        Self::sequence(items)
    }
}
