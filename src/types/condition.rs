use std::fmt;
use std::ops::Not;

use serde::{Deserialize, Serialize};

use super::Value;

/// Comparison operators a leaf condition can apply.
///
/// Operator names are matched exactly as written in configuration. Names this
/// crate does not know are kept as [`Operator::Unknown`] and evaluate to
/// `false` instead of failing the load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    /// `eq` / `equals`
    #[default]
    Eq,
    /// `neq` / `not_equals`
    Neq,
    In,
    NotIn,
    IsEmpty,
    IsNotEmpty,
    ExistsWithValue,
    IsEmptyOrFalse,
    Unknown(String),
}

impl Operator {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
            Operator::ExistsWithValue => "exists_with_value",
            Operator::IsEmptyOrFalse => "is_empty_or_false",
            Operator::Unknown(name) => name,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Operator::Unknown(_))
    }
}

impl From<&str> for Operator {
    fn from(name: &str) -> Self {
        match name {
            "eq" | "equals" => Operator::Eq,
            "neq" | "not_equals" => Operator::Neq,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "is_empty" => Operator::IsEmpty,
            "is_not_empty" => Operator::IsNotEmpty,
            "exists_with_value" => Operator::ExistsWithValue,
            "is_empty_or_false" => Operator::IsEmptyOrFalse,
            other => Operator::Unknown(other.to_owned()),
        }
    }
}

impl From<String> for Operator {
    fn from(name: String) -> Self {
        Operator::from(name.as_str())
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Unknown(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single comparison.
///
/// Lookup mode is decided by which of `field` / `source` are set: `field`
/// alone reads the context, `source` + `field` reads one data-source field,
/// `source` alone checks the data source as a whole.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Leaf {
    pub op: Operator,
    pub field: Option<String>,
    pub source: Option<String>,
    /// Configured operand; `Null` when the configuration gave none.
    pub val: Value,
}

/// Recursive condition tree attached to rules, sub-rules and condition
/// templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCondition", into = "RawCondition")]
pub enum Condition {
    /// True iff every child is true. Empty is true.
    All(Vec<Condition>),
    /// True iff some child is true. Empty is false.
    Any(Vec<Condition>),
    Not(Box<Condition>),
    /// Evaluate the named entry of the template registry.
    Template(String),
    Leaf(Leaf),
}

impl Condition {
    /// Conjunction. Extends `self` in place when it is already an `All`.
    #[must_use]
    pub fn and(self, other: Condition) -> Condition {
        match self {
            Condition::All(mut children) => {
                children.push(other);
                Condition::All(children)
            }
            first => Condition::All(vec![first, other]),
        }
    }

    /// Disjunction. Extends `self` in place when it is already an `Any`.
    #[must_use]
    pub fn or(self, other: Condition) -> Condition {
        match self {
            Condition::Any(mut children) => {
                children.push(other);
                Condition::Any(children)
            }
            first => Condition::Any(vec![first, other]),
        }
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        Condition::Not(Box::new(self))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::All(children) => write_joined(f, children, " AND ", "TRUE"),
            Condition::Any(children) => write_joined(f, children, " OR ", "FALSE"),
            Condition::Not(inner) => write!(f, "(NOT {inner})"),
            Condition::Template(name) => write!(f, "@{name}"),
            Condition::Leaf(leaf) => {
                let target = match (&leaf.source, &leaf.field) {
                    (Some(source), Some(field)) => format!("{source}:{field}"),
                    (Some(source), None) => format!("{source}:*"),
                    (None, Some(field)) => field.clone(),
                    (None, None) => "?".to_owned(),
                };
                if leaf.val.is_null() {
                    write!(f, "({target} {})", leaf.op)
                } else {
                    let operand = serde_json::Value::from(leaf.val.clone());
                    write!(f, "({target} {} {operand})", leaf.op)
                }
            }
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    children: &[Condition],
    sep: &str,
    empty: &str,
) -> fmt::Result {
    if children.is_empty() {
        return f.write_str(empty);
    }
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}

/// Wire shape of a condition node. Exactly one shape key is expected; when
/// several are present `use_template` wins, then `all`, `any`, `not`, and
/// finally the leaf fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawCondition {
    #[serde(skip_serializing_if = "Option::is_none")]
    use_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    all: Option<Vec<Condition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    any: Option<Vec<Condition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    not: Option<Box<Condition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    op: Option<Operator>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    val: Value,
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        if let Some(name) = raw.use_template {
            return Condition::Template(name);
        }
        if let Some(children) = raw.all {
            return Condition::All(children);
        }
        if let Some(children) = raw.any {
            return Condition::Any(children);
        }
        if let Some(inner) = raw.not {
            return Condition::Not(inner);
        }
        Condition::Leaf(Leaf {
            op: raw.op.unwrap_or_default(),
            field: raw.field,
            source: raw.source,
            val: raw.val,
        })
    }
}

impl From<Condition> for RawCondition {
    fn from(cond: Condition) -> Self {
        match cond {
            Condition::All(children) => RawCondition {
                all: Some(children),
                ..RawCondition::default()
            },
            Condition::Any(children) => RawCondition {
                any: Some(children),
                ..RawCondition::default()
            },
            Condition::Not(inner) => RawCondition {
                not: Some(inner),
                ..RawCondition::default()
            },
            Condition::Template(name) => RawCondition {
                use_template: Some(name),
                ..RawCondition::default()
            },
            Condition::Leaf(leaf) => RawCondition {
                source: leaf.source,
                field: leaf.field,
                op: Some(leaf.op),
                val: leaf.val,
                ..RawCondition::default()
            },
        }
    }
}

/// Intermediate builder for field comparisons.
/// Created by [`field()`] or [`SourceCondition::field()`]; requires an
/// operator method to produce a [`Condition`].
#[derive(Debug, Clone)]
pub struct FieldCondition {
    source: Option<String>,
    path: String,
}

impl FieldCondition {
    /// Build a leaf with an arbitrary operator.
    #[must_use]
    pub fn op(self, op: impl Into<Operator>, val: impl Into<Value>) -> Condition {
        Condition::Leaf(Leaf {
            op: op.into(),
            field: Some(self.path),
            source: self.source,
            val: val.into(),
        })
    }

    #[must_use]
    pub fn eq(self, val: impl Into<Value>) -> Condition {
        self.op(Operator::Eq, val)
    }

    #[must_use]
    pub fn neq(self, val: impl Into<Value>) -> Condition {
        self.op(Operator::Neq, val)
    }

    #[must_use]
    pub fn is_in(self, val: impl Into<Value>) -> Condition {
        self.op(Operator::In, val)
    }

    #[must_use]
    pub fn not_in(self, val: impl Into<Value>) -> Condition {
        self.op(Operator::NotIn, val)
    }

    #[must_use]
    pub fn is_empty(self) -> Condition {
        self.op(Operator::IsEmpty, Value::Null)
    }

    #[must_use]
    pub fn is_not_empty(self) -> Condition {
        self.op(Operator::IsNotEmpty, Value::Null)
    }

    #[must_use]
    pub fn exists_with_value(self) -> Condition {
        self.op(Operator::ExistsWithValue, Value::Null)
    }

    #[must_use]
    pub fn is_empty_or_false(self) -> Condition {
        self.op(Operator::IsEmptyOrFalse, Value::Null)
    }
}

/// Intermediate builder for data-source conditions. Created by [`source()`].
#[derive(Debug, Clone)]
pub struct SourceCondition {
    name: String,
}

impl SourceCondition {
    /// Compare one field of this source.
    #[must_use]
    pub fn field(self, path: &str) -> FieldCondition {
        FieldCondition {
            source: Some(self.name),
            path: path.to_owned(),
        }
    }

    /// Source-level check with an arbitrary operator.
    #[must_use]
    pub fn op(self, op: impl Into<Operator>) -> Condition {
        Condition::Leaf(Leaf {
            op: op.into(),
            field: None,
            source: Some(self.name),
            val: Value::Null,
        })
    }

    /// True iff the source has at least one non-blank value.
    #[must_use]
    pub fn is_not_empty(self) -> Condition {
        self.op(Operator::IsNotEmpty)
    }

    #[must_use]
    pub fn is_empty(self) -> Condition {
        self.op(Operator::IsEmpty)
    }
}

#[must_use]
pub fn field(path: &str) -> FieldCondition {
    FieldCondition {
        source: None,
        path: path.to_owned(),
    }
}

#[must_use]
pub fn source(name: &str) -> SourceCondition {
    SourceCondition {
        name: name.to_owned(),
    }
}

#[must_use]
pub fn use_template(name: &str) -> Condition {
    Condition::Template(name.to_owned())
}

#[must_use]
pub fn all(children: impl IntoIterator<Item = Condition>) -> Condition {
    Condition::All(children.into_iter().collect())
}

#[must_use]
pub fn any(children: impl IntoIterator<Item = Condition>) -> Condition {
    Condition::Any(children.into_iter().collect())
}
