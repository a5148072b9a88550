//! Conversion between [`Node`] trees and `serde` values
//!
//! Used for turning typed entities into subtrees (and back). Converted
//! nodes carry no comments and use the default scalar styles.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Number, Value};

use crate::error::{TreeError, TreeResult};
use crate::node::{Mapping, Node, NodeValue, Scalar, ScalarStyle, ScalarTag};

/// Build a node tree from a `serde_yaml` value
///
/// # Errors
/// Returns [`TreeError::UnsupportedKey`] for mapping keys that are not scalars
pub fn from_yaml_value(value: &Value) -> TreeResult<Node> {
    let node = match value {
        Value::Null => Node::null(),
        Value::Bool(b) => Node::scalar(Scalar::bool(*b)),
        Value::Number(n) => Node::scalar(number(n)),
        Value::String(s) => Node::string(s.as_str()),
        Value::Sequence(items) => Node::sequence(
            items
                .iter()
                .map(from_yaml_value)
                .collect::<TreeResult<Vec<_>>>()?,
        ),
        Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (key, value) in map {
                out.insert(key_string(key)?, from_yaml_value(value)?);
            }
            Node::mapping(out)
        }
        Value::Tagged(tagged) => from_yaml_value(&tagged.value)?,
    };
    Ok(node)
}

/// Convert a node tree into a `serde_yaml` value
///
/// # Errors
/// Currently infallible for trees built by this crate; kept fallible for
/// scalars whose text does not match their tag.
pub fn to_yaml_value(node: &Node) -> TreeResult<Value> {
    let value = match node.value() {
        NodeValue::Scalar(s) => scalar_value(s),
        NodeValue::Sequence(items) => Value::Sequence(
            items
                .iter()
                .map(to_yaml_value)
                .collect::<TreeResult<Vec<_>>>()?,
        ),
        NodeValue::Mapping(map) => {
            let mut out = serde_yaml::Mapping::with_capacity(map.len());
            for (key, value) in map {
                out.insert(Value::String(key.clone()), to_yaml_value(value)?);
            }
            Value::Mapping(out)
        }
    };
    Ok(value)
}

impl Node {
    /// Serialize a typed value into a node tree
    ///
    /// # Errors
    /// Returns error if the value cannot be represented as YAML
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> TreeResult<Self> {
        from_yaml_value(&serde_yaml::to_value(value)?)
    }

    /// Deserialize this subtree into a typed value
    ///
    /// # Errors
    /// Returns error if the subtree does not match the target type
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> TreeResult<T> {
        Ok(serde_yaml::from_value(to_yaml_value(self)?)?)
    }
}

fn key_string(key: &Value) -> TreeResult<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(number(n).text().to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Tagged(tagged) => key_string(&tagged.value),
        other => Err(TreeError::UnsupportedKey(format!("{other:?}"))),
    }
}

fn number(n: &Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        return Scalar::int(i);
    }
    if let Some(u) = n.as_u64() {
        return Scalar::new(u.to_string(), ScalarTag::Int, ScalarStyle::Plain);
    }
    let f = n.as_f64().unwrap_or(f64::NAN);
    let text = if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() {
        (if f > 0.0 { ".inf" } else { "-.inf" }).to_string()
    } else {
        let mut text = f.to_string();
        if !text.contains(['.', 'e', 'E']) {
            text.push_str(".0");
        }
        text
    };
    Scalar::new(text, ScalarTag::Float, ScalarStyle::Plain)
}

fn scalar_value(s: &Scalar) -> Value {
    let text = s.text();
    match s.tag() {
        ScalarTag::Null => Value::Null,
        ScalarTag::Bool => Value::Bool(s.as_bool().unwrap_or(false)),
        ScalarTag::Int => parse_int(text).map_or_else(|| Value::String(text.to_string()), Value::Number),
        ScalarTag::Float => parse_float(text)
            .map_or_else(|| Value::String(text.to_string()), |f| Value::Number(f.into())),
        ScalarTag::Str => Value::String(text.to_string()),
    }
}

fn parse_int(text: &str) -> Option<Number> {
    if let Some(hex) = text.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(Number::from);
    }
    if let Some(oct) = text.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).ok().map(Number::from);
    }
    let digits = text.strip_prefix('+').unwrap_or(text);
    digits
        .parse::<i64>()
        .map(Number::from)
        .ok()
        .or_else(|| digits.parse::<u64>().ok().map(Number::from))
}

fn parse_float(text: &str) -> Option<f64> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        _ => text.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        name: String,
        is_enabled: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        port: Option<u16>,
    }

    #[test]
    fn typed_value_roundtrip() {
        let sample = Sample {
            name: "ctx".into(),
            is_enabled: true,
            port: Some(8080),
        };
        let node = Node::from_serialize(&sample).unwrap();
        assert_eq!(node.get_str("name"), Some("ctx"));
        let keys: Vec<&String> = node.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "isEnabled", "port"]);
        assert_eq!(node.deserialize_into::<Sample>().unwrap(), sample);
    }

    #[test]
    fn numeric_strings_stay_strings() {
        let node = Node::from_serialize(&vec!["8080", "true"]).unwrap();
        let items = node.as_sequence().unwrap();
        assert_eq!(items[0].as_scalar().unwrap().tag(), ScalarTag::Str);
        assert_eq!(items[1].as_scalar().unwrap().style(), ScalarStyle::SingleQuoted);
    }

    #[test]
    fn plain_scalars_convert_by_tag() {
        assert_eq!(scalar_value(&Scalar::plain("0x1F")), Value::Number(31.into()));
        assert_eq!(scalar_value(&Scalar::plain("+7")), Value::Number(7.into()));
        assert_eq!(scalar_value(&Scalar::plain("~")), Value::Null);
        assert_eq!(scalar_value(&Scalar::plain("False")), Value::Bool(false));
        assert_eq!(scalar_value(&Scalar::plain("1.5")), Value::Number(1.5.into()));
    }

    #[test]
    fn float_text_keeps_its_type() {
        assert_eq!(number(&Number::from(2.0)).text(), "2.0");
        assert_eq!(number(&Number::from(f64::NEG_INFINITY)).text(), "-.inf");
    }

    #[test]
    fn wrong_shape_fails_to_deserialize() {
        let node = Node::string("not a struct");
        assert!(node.deserialize_into::<Sample>().is_err());
    }
}
