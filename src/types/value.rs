use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A JSON-compatible value carried by contexts, data-source results and
/// condition operands.
///
/// `Null` doubles as "absent": a field that cannot be resolved compares
/// exactly like an explicit `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    /// JSON `null`, or a lookup that found nothing.
    #[default]
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// An ordered sequence, used by `in` / `not_in` operands.
    List(Vec<Value>),
    /// A nested mapping, walked by dotted field paths.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Canonicalize this value for comparison.
    ///
    /// Strings are trimmed and lower-cased, and the literals `"true"` /
    /// `"false"` become booleans. Everything else passes through unchanged.
    /// Normalizing twice yields the same result as normalizing once.
    #[must_use]
    pub fn normalize(&self) -> Value {
        match self {
            Value::String(s) => {
                let folded = s.trim().to_lowercase();
                match folded.as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    _ => Value::String(folded),
                }
            }
            other => other.clone(),
        }
    }

    /// Structural equality where integers, floats and booleans compare
    /// numerically: `true` equals `1` and `1.0`, `false` equals `0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Bool(a), Value::Int(b)) | (Value::Int(b), Value::Bool(a)) => {
                i64::from(*a) == *b
            }
            (Value::Bool(a), Value::Float(b)) | (Value::Float(b), Value::Bool(a)) => {
                f64::from(u8::from(*a)) == *b
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.loose_eq(vb))
            }
            _ => self == other,
        }
    }

    /// Equality after normalizing both sides.
    #[must_use]
    pub fn normalized_eq(&self, other: &Value) -> bool {
        self.normalize().loose_eq(&other.normalize())
    }

    /// `null`, `""` or an empty sequence.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Blank, `false`, or numerically zero.
    ///
    /// Stricter than [`is_blank`](Self::is_blank): `false` and `0` count as
    /// empty here but as present there.
    #[must_use]
    pub fn is_empty_like(&self) -> bool {
        match self {
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            other => other.is_blank(),
        }
    }

    /// Whether the value carries content worth substituting into text.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Map(m) => !m.is_empty(),
            other => !other.is_empty_like(),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Map(map) => {
                serde_json::Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Renders the value as the text substituted into a message template.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Map(_) => write!(f, "{}", serde_json::Value::from(self.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_scalars() {
        assert_eq!(Value::from(42_i64), Value::Int(42));
        assert_eq!(Value::from(2.5_f64), Value::Float(2.5));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_owned()));
        assert_eq!(Value::from(None::<&str>), Value::Null);
    }

    #[test]
    fn from_vec() {
        assert_eq!(
            Value::from(vec!["E", "G"]),
            Value::List(vec![Value::from("E"), Value::from("G")])
        );
    }

    #[test]
    fn normalize_folds_case_and_whitespace() {
        assert_eq!(Value::from("  Member ").normalize(), Value::from("member"));
    }

    #[test]
    fn normalize_coerces_boolean_strings() {
        assert_eq!(Value::from("TRUE").normalize(), Value::Bool(true));
        assert_eq!(Value::from(" false ").normalize(), Value::Bool(false));
        assert_eq!(Value::from("falsey").normalize(), Value::from("falsey"));
    }

    #[test]
    fn normalize_passes_other_values_through() {
        assert_eq!(Value::Null.normalize(), Value::Null);
        assert_eq!(Value::Bool(false).normalize(), Value::Bool(false));
        assert_eq!(Value::Int(7).normalize(), Value::Int(7));
        assert_eq!(
            Value::from(vec!["A"]).normalize(),
            Value::from(vec!["A"]),
            "sequences are not folded element-wise"
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        for v in [
            Value::from(" Yes "),
            Value::from("True"),
            Value::Int(0),
            Value::Null,
            Value::Bool(true),
        ] {
            assert_eq!(v.normalize().normalize(), v.normalize());
        }
    }

    #[test]
    fn normalized_eq_ignores_case() {
        assert!(Value::from("VA").normalized_eq(&Value::from("va")));
        assert!(Value::from("true").normalized_eq(&Value::Bool(true)));
        assert!(!Value::from("VA").normalized_eq(&Value::from("NV")));
    }

    #[test]
    fn loose_eq_int_float_cross_type() {
        assert!(Value::Int(10).loose_eq(&Value::Float(10.0)));
        assert!(Value::Float(10.0).loose_eq(&Value::Int(10)));
        assert!(!Value::Int(10).loose_eq(&Value::Float(10.5)));
    }

    #[test]
    fn loose_eq_bool_equals_one_and_zero() {
        assert!(Value::Bool(true).loose_eq(&Value::Int(1)));
        assert!(Value::Int(0).loose_eq(&Value::Bool(false)));
        assert!(Value::Bool(true).loose_eq(&Value::Float(1.0)));
        assert!(Value::Float(0.0).loose_eq(&Value::Bool(false)));
        assert!(!Value::Bool(true).loose_eq(&Value::Int(2)));
        assert!(!Value::Bool(false).loose_eq(&Value::Int(1)));
        assert!(!Value::Bool(true).loose_eq(&Value::Float(0.5)));
    }

    #[test]
    fn blank_and_empty_like_disagree_on_false_and_zero() {
        assert!(!Value::Bool(false).is_blank());
        assert!(Value::Bool(false).is_empty_like());
        assert!(!Value::Int(0).is_blank());
        assert!(Value::Int(0).is_empty_like());
        assert!(Value::Float(0.0).is_empty_like());

        for v in [Value::Null, Value::from(""), Value::List(vec![])] {
            assert!(v.is_blank());
            assert!(v.is_empty_like());
        }
    }

    #[test]
    fn empty_map_is_present_but_not_truthy() {
        let empty = Value::Map(BTreeMap::new());
        assert!(!empty.is_blank());
        assert!(!empty.is_empty_like());
        assert!(!empty.is_truthy());
    }

    #[test]
    fn display_renders_plain_text() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Bool(false).to_string(), "False");
        assert_eq!(Value::from("PO Box 1").to_string(), "PO Box 1");
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "a, b");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn converts_from_json() {
        let json = serde_json::json!({"a": [1, 2.5, null], "b": "x"});
        let value = Value::from(json);
        let map = value.as_map().unwrap();
        assert_eq!(
            map["a"],
            Value::List(vec![Value::Int(1), Value::Float(2.5), Value::Null])
        );
        assert_eq!(map["b"], Value::from("x"));
    }
}
