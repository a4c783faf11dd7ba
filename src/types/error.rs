use std::fmt;

use thiserror::Error;

/// Fatal configuration problems. A ruleset that fails to compile is never
/// served.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("duplicate rule id '{id}'")]
    DuplicateRule { id: String },

    #[error("rule #{position} has an empty id")]
    EmptyRuleId { position: usize },

    #[error("cyclic condition template reference: {}", path.join(" -> "))]
    CyclicTemplate { path: Vec<String> },
}

/// Tolerated configuration defects, reported alongside a compiled ruleset.
///
/// `owner` is the id of the rule or sub-rule, or `template:<name>` for a
/// condition template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    DuplicatePriority { priority: i64, rules: Vec<String> },
    UnknownTemplate { owner: String, template: String },
    UnknownOperator { owner: String, op: String },
    EmptyLeaf { owner: String },
    MissingMessage { owner: String, message_ref: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DuplicatePriority { priority, rules } => write!(
                f,
                "duplicate priority {priority} shared by {}; declaration order decides",
                rules.join(", ")
            ),
            Warning::UnknownTemplate { owner, template } => {
                write!(f, "{owner}: condition template '{template}' is not defined")
            }
            Warning::UnknownOperator { owner, op } => {
                write!(f, "{owner}: unknown operator '{op}' always evaluates false")
            }
            Warning::EmptyLeaf { owner } => {
                write!(f, "{owner}: condition has neither 'field' nor 'source'")
            }
            Warning::MissingMessage { owner, message_ref } => {
                write!(f, "{owner}: message_ref '{message_ref}' has no message template")
            }
        }
    }
}
