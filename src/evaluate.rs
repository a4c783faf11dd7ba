use std::time::Instant;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::types::TemplateRegistry;
use crate::{
    Condition, Context, DataSources, EvaluationReport, Leaf, MatchResult, Operator, Rule,
    SourceFields, Value,
};

/// Deepest condition nesting, counting template expansion, before a rule is
/// treated as faulted.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Error)]
enum EvalError {
    #[error("condition nesting exceeds {MAX_DEPTH} levels")]
    DepthExceeded,
}

pub(crate) fn evaluate(
    rules: &[Rule],
    templates: &TemplateRegistry,
    ctx: &Context,
    ds: &DataSources,
) -> Option<MatchResult> {
    for rule in rules {
        match match_rule(rule, templates, ctx, ds) {
            Ok(Some(matched)) => {
                debug!(rule = %rule.id, matched = %matched.rule_id, "rule matched");
                return Some(matched);
            }
            Ok(None) => {}
            Err(e) => warn!(rule = %rule.id, error = %e, "rule evaluation faulted, skipping"),
        }
    }
    debug!(rules = rules.len(), "no rule matched");
    None
}

pub(crate) fn evaluate_detailed(
    rules: &[Rule],
    templates: &TemplateRegistry,
    ctx: &Context,
    ds: &DataSources,
) -> EvaluationReport {
    let start = Instant::now();
    let mut checked = Vec::new();
    let mut faulted = Vec::new();
    let mut matched = None;

    for rule in rules {
        checked.push(rule.id.clone());
        match match_rule(rule, templates, ctx, ds) {
            Ok(Some(m)) => {
                matched = Some(m);
                break;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(rule = %rule.id, error = %e, "rule evaluation faulted, skipping");
                faulted.push(rule.id.clone());
            }
        }
    }

    EvaluationReport::new(matched, checked, faulted, start.elapsed())
}

pub(crate) fn candidates<'a>(
    rules: &'a [Rule],
    templates: &TemplateRegistry,
    ctx: &Context,
    ds: &DataSources,
) -> Vec<&'a Rule> {
    rules
        .iter()
        .filter(|rule| matches!(eval_condition(&rule.conditions, templates, ctx, ds, 0), Ok(true)))
        .collect()
}

/// Rule-level match, then the first matching sub-rule. A rule whose
/// sub-rules all fail still matches as itself.
fn match_rule(
    rule: &Rule,
    templates: &TemplateRegistry,
    ctx: &Context,
    ds: &DataSources,
) -> Result<Option<MatchResult>, EvalError> {
    trace!(rule = %rule.id, priority = rule.priority, "checking rule");
    if !eval_condition(&rule.conditions, templates, ctx, ds, 0)? {
        return Ok(None);
    }
    for sub in &rule.sub_rules {
        if eval_condition(&sub.conditions, templates, ctx, ds, 0)? {
            return Ok(Some(MatchResult::from_sub_rule(rule, sub)));
        }
    }
    Ok(Some(MatchResult::from_rule(rule)))
}

fn eval_condition(
    condition: &Condition,
    templates: &TemplateRegistry,
    ctx: &Context,
    ds: &DataSources,
    depth: usize,
) -> Result<bool, EvalError> {
    if depth > MAX_DEPTH {
        return Err(EvalError::DepthExceeded);
    }
    match condition {
        Condition::All(children) => {
            for child in children {
                if !eval_condition(child, templates, ctx, ds, depth + 1)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Condition::Any(children) => {
            for child in children {
                if eval_condition(child, templates, ctx, ds, depth + 1)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Condition::Not(inner) => Ok(!eval_condition(inner, templates, ctx, ds, depth + 1)?),
        Condition::Template(name) => match templates.get(name) {
            Some(body) => eval_condition(body, templates, ctx, ds, depth + 1),
            None => {
                warn!(template = %name, "condition template not defined, evaluating false");
                Ok(false)
            }
        },
        Condition::Leaf(leaf) => Ok(eval_leaf(leaf, ctx, ds)),
    }
}

fn eval_leaf(leaf: &Leaf, ctx: &Context, ds: &DataSources) -> bool {
    match (&leaf.source, &leaf.field) {
        // Source-only leaves accept any operator name, known or not.
        (Some(source), None) => check_source(ds.get(source), &leaf.op),
        _ if !leaf.op.is_known() => {
            warn!(op = %leaf.op, "unknown operator, evaluating false");
            false
        }
        // No tiered fallback inside a data source.
        (Some(source), Some(field)) => compare(ds.field(source, field), &leaf.op, &leaf.val),
        (None, Some(field)) => compare(ctx.resolve(field), &leaf.op, &leaf.val),
        (None, None) => compare(None, &leaf.op, &leaf.val),
    }
}

/// Whole-source checks. Only emptiness is meaningful without a field; any
/// other operator asks whether the source returned anything at all.
fn check_source(fields: Option<&SourceFields>, op: &Operator) -> bool {
    let has_value = fields.is_some_and(|f| f.values().any(|v| !v.is_blank()));
    match op {
        Operator::IsNotEmpty => has_value,
        Operator::IsEmpty => !has_value,
        _ => fields.is_some_and(|f| !f.is_empty()),
    }
}

fn compare(actual: Option<&Value>, op: &Operator, expected: &Value) -> bool {
    let raw = actual.unwrap_or(&Value::Null);
    match op {
        Operator::Eq => raw.normalized_eq(expected),
        Operator::Neq => !raw.normalized_eq(expected),
        Operator::In => contains(expected, raw),
        Operator::NotIn => !contains(expected, raw),
        // Emptiness checks look at the raw value.
        Operator::IsEmpty => raw.is_empty_like(),
        Operator::IsNotEmpty => !raw.is_empty_like(),
        Operator::ExistsWithValue => !raw.is_blank(),
        Operator::IsEmptyOrFalse => {
            raw.is_empty_like() || matches!(raw, Value::String(s) if s == "false" || s == "False")
        }
        Operator::Unknown(_) => false,
    }
}

/// Membership for `in` / `not_in`. A scalar operand degrades to equality.
fn contains(expected: &Value, actual: &Value) -> bool {
    match expected {
        Value::List(items) => {
            let actual = actual.normalize();
            items.iter().any(|item| actual.loose_eq(&item.normalize()))
        }
        scalar => actual.normalized_eq(scalar),
    }
}
