mod compile;
mod config;
mod engine;
mod error;
mod evaluate;
pub mod message;
mod types;

pub use config::RuleConfig;
pub use engine::{Engine, Outcome, Snapshot};
pub use error::RoutebookError;
pub use message::{MessageCatalog, RenderedMessage};
pub use types::{
    Condition, CompileError, Context, DataSources, EvaluationReport, FieldCondition, Leaf,
    MatchResult, Operator, Rule, RuleBuilder, RuleSet, RuleSetBuilder, RuleSummary,
    SourceCondition, SourceFields, SubRule, SubRuleBuilder, TemplateRegistry, Value, Warning, all,
    any, field, source, use_template,
};
