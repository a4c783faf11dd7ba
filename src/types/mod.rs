mod condition;
mod context;
mod data_sources;
mod error;
mod evaluation_report;
mod match_result;
mod rule;
mod ruleset;
mod template_registry;
mod value;

pub use condition::{
    Condition, FieldCondition, Leaf, Operator, SourceCondition, all, any, field, source,
    use_template,
};
pub use context::Context;
pub use data_sources::{DataSources, SourceFields};
pub use error::{CompileError, Warning};
pub use evaluation_report::EvaluationReport;
pub use match_result::MatchResult;
pub use rule::{Rule, RuleSummary, SubRule};
pub use ruleset::{RuleBuilder, RuleSet, RuleSetBuilder, SubRuleBuilder};
pub use template_registry::TemplateRegistry;
pub use value::Value;
