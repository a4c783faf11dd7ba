use std::collections::BTreeMap;

use super::Condition;

/// Named, reusable condition sub-trees referenced by [`Condition::Template`].
///
/// Built once per compiled ruleset and never mutated afterwards. Compilation
/// guarantees that no template reaches itself through other templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Condition>,
}

impl TemplateRegistry {
    pub(crate) fn new(templates: BTreeMap<String, Condition>) -> Self {
        Self { templates }
    }

    /// Look up a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Condition> {
        self.templates.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// The number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Iterate over all (name, condition) pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.templates.iter().map(|(k, v)| (k.as_str(), v))
    }
}
