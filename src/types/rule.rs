use serde::{Deserialize, Serialize};

use super::Condition;

pub(crate) const DEFAULT_PRIORITY: i64 = 999;

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

fn default_active() -> bool {
    true
}

/// A business rule routing a matching context to a message template.
///
/// Rules are declared in configuration or via
/// [`RuleSetBuilder`](super::RuleSetBuilder) and compiled into a
/// [`RuleSet`](super::RuleSet). Lower `priority` values are evaluated first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default = "default_active")]
    pub active: bool,
    pub conditions: Condition,
    pub message_ref: String,
    /// Placeholder names the message is expected to use. Informational only.
    #[serde(default)]
    pub placeholders: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Refinements tried in order once the rule itself matched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_rules: Vec<SubRule>,
}

/// A refinement of a matched [`Rule`].
///
/// `message_ref` and `placeholders` fall back to the parent's when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubRule {
    pub id: String,
    pub conditions: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholders: Option<Vec<String>>,
}

/// Listing view of a rule, for administrative callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub id: String,
    pub name: String,
    pub priority: i64,
    pub active: bool,
    pub tags: Vec<String>,
    pub message_ref: String,
}

impl From<&Rule> for RuleSummary {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id.clone(),
            name: rule.name.clone(),
            priority: rule.priority,
            active: rule.active,
            tags: rule.tags.clone(),
            message_ref: rule.message_ref.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field;

    #[test]
    fn deserialize_applies_defaults() {
        let rule: Rule = serde_json::from_str(
            r#"{"id": "R1", "conditions": {"field": "x", "val": 1}, "message_ref": "M1"}"#,
        )
        .unwrap();
        assert_eq!(rule.name, "");
        assert_eq!(rule.priority, DEFAULT_PRIORITY);
        assert!(rule.active);
        assert!(rule.placeholders.is_empty());
        assert!(rule.tags.is_empty());
        assert!(rule.sub_rules.is_empty());
        assert_eq!(rule.conditions, field("x").eq(1_i64));
    }

    #[test]
    fn deserialize_requires_id_conditions_and_message_ref() {
        for json in [
            r#"{"conditions": {}, "message_ref": "M"}"#,
            r#"{"id": "R", "message_ref": "M"}"#,
            r#"{"id": "R", "conditions": {}}"#,
        ] {
            assert!(serde_json::from_str::<Rule>(json).is_err(), "accepted {json}");
        }
    }

    #[test]
    fn deserialize_sub_rules() {
        let rule: Rule = serde_json::from_str(
            r#"{
                "id": "R1", "priority": 5, "conditions": {"all": []}, "message_ref": "PARENT",
                "placeholders": ["Policy.PolicyState"],
                "sub_rules": [
                    {"id": "R1a", "conditions": {"field": "a", "val": true}, "message_ref": "CHILD"},
                    {"id": "R1b", "conditions": {"field": "b", "val": true}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(rule.sub_rules.len(), 2);
        assert_eq!(rule.sub_rules[0].message_ref.as_deref(), Some("CHILD"));
        assert_eq!(rule.sub_rules[1].message_ref, None);
        assert_eq!(rule.sub_rules[1].placeholders, None);
    }

    #[test]
    fn summary_from_rule() {
        let rule = Rule {
            id: "R1".into(),
            name: "FEHBP member".into(),
            priority: 10,
            active: true,
            conditions: field("x").eq(1_i64),
            message_ref: "FEHBP_MEMBER".into(),
            placeholders: vec![],
            tags: vec!["fehbp".into()],
            sub_rules: vec![],
        };
        let summary = RuleSummary::from(&rule);
        assert_eq!(summary.id, "R1");
        assert_eq!(summary.priority, 10);
        assert_eq!(summary.tags, ["fehbp"]);
        assert_eq!(summary.message_ref, "FEHBP_MEMBER");
    }
}
