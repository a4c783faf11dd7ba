use std::fmt;

use serde::{Deserialize, Serialize};

use super::rule::{Rule, SubRule};

/// The rule (or sub-rule) selected by first-match evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct MatchResult {
    /// Id of the matched rule, or of the matched sub-rule.
    pub rule_id: String,
    /// Set only when a sub-rule matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_rule_id: Option<String>,
    pub name: String,
    pub message_ref: String,
    pub placeholders: Vec<String>,
    pub priority: i64,
    pub tags: Vec<String>,
}

impl MatchResult {
    pub(crate) fn from_rule(rule: &Rule) -> Self {
        Self {
            rule_id: rule.id.clone(),
            parent_rule_id: None,
            name: rule.name.clone(),
            message_ref: rule.message_ref.clone(),
            placeholders: rule.placeholders.clone(),
            priority: rule.priority,
            tags: rule.tags.clone(),
        }
    }

    /// A sub-rule match carries the parent's name, priority and tags.
    pub(crate) fn from_sub_rule(parent: &Rule, sub: &SubRule) -> Self {
        Self {
            rule_id: sub.id.clone(),
            parent_rule_id: Some(parent.id.clone()),
            name: parent.name.clone(),
            message_ref: sub
                .message_ref
                .clone()
                .unwrap_or_else(|| parent.message_ref.clone()),
            placeholders: sub
                .placeholders
                .clone()
                .unwrap_or_else(|| parent.placeholders.clone()),
            priority: parent.priority,
            tags: parent.tags.clone(),
        }
    }

    /// Whether a sub-rule, rather than the rule itself, matched.
    #[must_use]
    pub fn is_sub_rule(&self) -> bool {
        self.parent_rule_id.is_some()
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent_rule_id {
            Some(parent) => write!(f, "{parent}/{} -> {}", self.rule_id, self.message_ref),
            None => write!(f, "{} -> {}", self.rule_id, self.message_ref),
        }
    }
}
