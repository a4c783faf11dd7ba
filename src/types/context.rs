use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Value;

/// Caller-supplied facts about the subject of a decision.
///
/// Keys are stored exactly as given: `"Policy.PolicyState"` is one flat key,
/// not a path. Nested structure comes from [`Value::Map`] entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    data: HashMap<String, Value>,
}

impl Context {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flat key. Dots in `key` are kept verbatim.
    #[must_use]
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value.into());
        self
    }

    /// Insert a flat key (mutable reference version).
    pub fn insert(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_owned(), value);
    }

    /// Flat lookup with no path handling.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a possibly dotted field name. First hit wins:
    ///
    /// 1. `field` as a flat key;
    /// 2. `field` as a dotted path through nested maps;
    /// 3. the last dot-separated segment as a flat key.
    #[must_use]
    pub fn resolve(&self, field: &str) -> Option<&Value> {
        if let Some(v) = self.data.get(field) {
            return Some(v);
        }
        if field.contains('.') {
            if let Some(v) = self.descend(field) {
                return Some(v);
            }
        }
        let short = field.rsplit('.').next().unwrap_or(field);
        self.data.get(short)
    }

    fn descend(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.data.get(segments.next()?)?;
        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
