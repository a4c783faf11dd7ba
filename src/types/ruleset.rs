use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::condition::Condition;
use super::context::Context;
use super::data_sources::DataSources;
use super::error::{CompileError, Warning};
use super::evaluation_report::EvaluationReport;
use super::match_result::MatchResult;
use super::rule::{Rule, RuleSummary, SubRule, DEFAULT_PRIORITY};
use super::template_registry::TemplateRegistry;
use crate::config::RuleConfig;

/// Builder for constructing a [`RuleSet`] in code.
///
/// Applies the same validation as loading a [`RuleConfig`].
///
/// # Example
///
/// ```
/// use routebook::{field, source, use_template, Context, DataSources, RuleSetBuilder};
///
/// let ruleset = RuleSetBuilder::new()
///     .template("is_member", field("HCCustomerType").eq("Member"))
///     .rule("R001_FEHBP_MEMBER", |r| {
///         r.priority(10)
///             .when(use_template("is_member").and(source("fehbp_address").is_not_empty()))
///             .message("FEHBP_MEMBER")
///     })
///     .compile()
///     .unwrap();
///
/// let ctx = Context::new().set("HCCustomerType", "member");
/// let ds = DataSources::new().set("fehbp_address", "MailingAddress", "PO Box 1");
/// assert_eq!(ruleset.evaluate(&ctx, &ds).unwrap().message_ref, "FEHBP_MEMBER");
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<Rule>,
    templates: BTreeMap<String, Condition>,
    data_sources: BTreeMap<String, serde_json::Value>,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug)]
pub struct RuleBuilder {
    rule: Rule,
}

/// Intermediate builder passed to the sub-rule definition closure.
#[derive(Debug)]
pub struct SubRuleBuilder {
    sub: SubRule,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule. Until `.when()` is called the rule matches every context.
    #[must_use]
    pub fn rule(mut self, id: &str, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder {
            rule: Rule {
                id: id.to_owned(),
                name: String::new(),
                priority: DEFAULT_PRIORITY,
                active: true,
                conditions: Condition::All(Vec::new()),
                message_ref: String::new(),
                placeholders: Vec::new(),
                tags: Vec::new(),
                sub_rules: Vec::new(),
            },
        });
        self.rules.push(builder.rule);
        self
    }

    /// Register a named condition template.
    #[must_use]
    pub fn template(mut self, name: &str, condition: Condition) -> Self {
        self.templates.insert(name.to_owned(), condition);
        self
    }

    /// Record a data-source description for introspection.
    #[must_use]
    pub fn data_source(mut self, name: &str, description: serde_json::Value) -> Self {
        self.data_sources.insert(name.to_owned(), description);
        self
    }

    /// Compile the rules into an immutable `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if validation fails.
    pub fn compile(self) -> Result<RuleSet, CompileError> {
        crate::compile::compile(self.rules, self.templates, self.data_sources)
    }
}

impl RuleBuilder {
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.rule.name = name.to_owned();
        self
    }

    /// Lower values are evaluated first.
    #[must_use]
    pub fn priority(mut self, priority: i64) -> Self {
        self.rule.priority = priority;
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.rule.active = active;
        self
    }

    /// Set the condition for this rule.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.rule.conditions = condition;
        self
    }

    /// Set the message template this rule routes to.
    #[must_use]
    pub fn message(mut self, message_ref: &str) -> Self {
        self.rule.message_ref = message_ref.to_owned();
        self
    }

    #[must_use]
    pub fn placeholders<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule.placeholders = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Append a sub-rule. Sub-rules are tried in the order they are added.
    #[must_use]
    pub fn sub_rule(mut self, id: &str, f: impl FnOnce(SubRuleBuilder) -> SubRuleBuilder) -> Self {
        let builder = f(SubRuleBuilder {
            sub: SubRule {
                id: id.to_owned(),
                conditions: Condition::All(Vec::new()),
                message_ref: None,
                placeholders: None,
            },
        });
        self.rule.sub_rules.push(builder.sub);
        self
    }
}

impl SubRuleBuilder {
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.sub.conditions = condition;
        self
    }

    /// Override the parent's message template.
    #[must_use]
    pub fn message(mut self, message_ref: &str) -> Self {
        self.sub.message_ref = Some(message_ref.to_owned());
        self
    }

    /// Override the parent's placeholder list.
    #[must_use]
    pub fn placeholders<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub.placeholders = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// A compiled, immutable ruleset: the active rules in evaluation order plus
/// the condition templates they reference. Thread-safe and designed to live
/// behind `Arc`.
#[derive(Debug)]
pub struct RuleSet {
    /// Active rules sorted ascending by priority, ties in declaration order.
    pub(crate) rules: Vec<Rule>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) templates: TemplateRegistry,
    pub(crate) data_sources: BTreeMap<String, serde_json::Value>,
    pub(crate) warnings: Vec<Warning>,
}

impl RuleSet {
    /// Evaluate this ruleset against the given context and data sources.
    ///
    /// Returns the first matching rule in priority order (or its first
    /// matching sub-rule), or `None` when nothing matches.
    #[must_use]
    pub fn evaluate(&self, ctx: &Context, ds: &DataSources) -> Option<MatchResult> {
        crate::evaluate::evaluate(&self.rules, &self.templates, ctx, ds)
    }

    /// Evaluate with diagnostics: which rules were checked, which faulted,
    /// and how long it took.
    pub fn evaluate_detailed(&self, ctx: &Context, ds: &DataSources) -> EvaluationReport {
        crate::evaluate::evaluate_detailed(&self.rules, &self.templates, ctx, ds)
    }

    /// Every rule whose own conditions hold, in evaluation order.
    ///
    /// Sub-rules are not consulted. The first entry is the rule
    /// [`evaluate()`](Self::evaluate) selects.
    #[must_use]
    pub fn candidates(&self, ctx: &Context, ds: &DataSources) -> Vec<&Rule> {
        crate::evaluate::candidates(&self.rules, &self.templates, ctx, ds)
    }

    /// Compile a parsed configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if validation fails.
    pub fn from_config(config: RuleConfig) -> Result<Self, CompileError> {
        crate::compile::compile(
            config.rules,
            config.condition_templates,
            config.data_sources,
        )
    }

    /// Parse JSON configuration text and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`RoutebookError`](crate::RoutebookError) on parse or compile failure.
    pub fn from_json(input: &str) -> Result<Self, crate::RoutebookError> {
        let config = RuleConfig::from_json(input)?;
        Ok(Self::from_config(config)?)
    }

    /// Read a JSON configuration file and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`RoutebookError`](crate::RoutebookError) on I/O, parse, or
    /// compile failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::RoutebookError> {
        let config = RuleConfig::from_file(path)?;
        Ok(Self::from_config(config)?)
    }

    /// The active rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Listing view of the active rules, in evaluation order.
    #[must_use]
    pub fn list_rules(&self) -> Vec<RuleSummary> {
        self.rules.iter().map(RuleSummary::from).collect()
    }

    /// Look up an active rule by id. Sub-rule ids are not indexed.
    #[must_use]
    pub fn get_rule_by_id(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).and_then(|&idx| self.rules.get(idx))
    }

    /// Rule ids in evaluation order.
    #[must_use]
    pub fn evaluation_order(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id.as_str()).collect()
    }

    #[must_use]
    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Names of the condition templates, sorted.
    #[must_use]
    pub fn template_names(&self) -> Vec<&str> {
        self.templates.names().collect()
    }

    /// Data-source descriptions carried by the configuration.
    #[must_use]
    pub fn data_sources(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.data_sources
    }

    /// Tolerated configuration defects found at compile time.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleSet({} rules, {} templates, {} warnings)",
            self.rules.len(),
            self.templates.len(),
            self.warnings.len(),
        )
    }
}
