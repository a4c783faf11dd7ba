use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{info, warn};

use crate::types::TemplateRegistry;
use crate::{CompileError, Condition, Rule, RuleSet, Warning};

pub(crate) fn compile(
    rules: Vec<Rule>,
    templates: BTreeMap<String, Condition>,
    data_sources: BTreeMap<String, serde_json::Value>,
) -> Result<RuleSet, CompileError> {
    check_ids(&rules)?;
    check_template_cycles(&templates)?;

    let mut warnings = Vec::new();
    for (name, condition) in &templates {
        inspect(condition, &format!("template:{name}"), &templates, &mut warnings);
    }

    let mut active: Vec<Rule> = rules.into_iter().filter(|r| r.active).collect();
    // Stable: equal priorities keep declaration order.
    active.sort_by_key(|r| r.priority);

    for rule in &active {
        inspect(&rule.conditions, &rule.id, &templates, &mut warnings);
        for sub in &rule.sub_rules {
            inspect(&sub.conditions, &sub.id, &templates, &mut warnings);
        }
    }
    warnings.extend(duplicate_priorities(&active));

    for warning in &warnings {
        warn!(%warning, "rule configuration warning");
    }

    let index: HashMap<String, usize> = active
        .iter()
        .enumerate()
        .map(|(i, rule)| (rule.id.clone(), i))
        .collect();

    info!(
        rules = active.len(),
        templates = templates.len(),
        warnings = warnings.len(),
        "compiled ruleset"
    );

    Ok(RuleSet {
        rules: active,
        index,
        templates: TemplateRegistry::new(templates),
        data_sources,
        warnings,
    })
}

fn check_ids(rules: &[Rule]) -> Result<(), CompileError> {
    let mut seen = HashSet::new();
    for (position, rule) in rules.iter().enumerate() {
        if rule.id.trim().is_empty() {
            return Err(CompileError::EmptyRuleId { position });
        }
        if !seen.insert(rule.id.as_str()) {
            return Err(CompileError::DuplicateRule {
                id: rule.id.clone(),
            });
        }
    }
    Ok(())
}

/// Collect tolerated defects in one condition tree.
fn inspect(
    condition: &Condition,
    owner: &str,
    templates: &BTreeMap<String, Condition>,
    warnings: &mut Vec<Warning>,
) {
    match condition {
        Condition::All(children) | Condition::Any(children) => {
            for child in children {
                inspect(child, owner, templates, warnings);
            }
        }
        Condition::Not(inner) => inspect(inner, owner, templates, warnings),
        Condition::Template(name) => {
            if !templates.contains_key(name) {
                warnings.push(Warning::UnknownTemplate {
                    owner: owner.to_owned(),
                    template: name.clone(),
                });
            }
        }
        Condition::Leaf(leaf) => {
            if !leaf.op.is_known() {
                warnings.push(Warning::UnknownOperator {
                    owner: owner.to_owned(),
                    op: leaf.op.as_str().to_owned(),
                });
            }
            if leaf.field.is_none() && leaf.source.is_none() {
                warnings.push(Warning::EmptyLeaf {
                    owner: owner.to_owned(),
                });
            }
        }
    }
}

fn duplicate_priorities(sorted: &[Rule]) -> Vec<Warning> {
    let mut groups: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for rule in sorted {
        groups.entry(rule.priority).or_default().push(rule.id.clone());
    }
    groups
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(priority, rules)| Warning::DuplicatePriority { priority, rules })
        .collect()
}

fn collect_template_refs<'a>(condition: &'a Condition, refs: &mut Vec<&'a str>) {
    match condition {
        Condition::Template(name) => refs.push(name),
        Condition::All(children) | Condition::Any(children) => {
            for child in children {
                collect_template_refs(child, refs);
            }
        }
        Condition::Not(inner) => collect_template_refs(inner, refs),
        Condition::Leaf(_) => {}
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DfsState {
    Unvisited,
    InStack,
    Done,
}

/// Reject template graphs in which a template reaches itself.
fn check_template_cycles(templates: &BTreeMap<String, Condition>) -> Result<(), CompileError> {
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for (name, condition) in templates {
        let mut refs = Vec::new();
        collect_template_refs(condition, &mut refs);
        refs.retain(|r| templates.contains_key(*r));
        adj.insert(name.as_str(), refs);
    }

    let mut state: HashMap<&str, DfsState> = templates
        .keys()
        .map(|name| (name.as_str(), DfsState::Unvisited))
        .collect();
    let mut stack: Vec<&str> = Vec::new();

    for name in templates.keys() {
        if state.get(name.as_str()) == Some(&DfsState::Unvisited) {
            if let Some(path) = dfs(name, &adj, &mut state, &mut stack) {
                return Err(CompileError::CyclicTemplate { path });
            }
        }
    }
    Ok(())
}

fn dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    state: &mut HashMap<&'a str, DfsState>,
    stack: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    state.insert(node, DfsState::InStack);
    stack.push(node);

    if let Some(neighbors) = adj.get(node) {
        for &neighbor in neighbors {
            match state.get(neighbor) {
                Some(DfsState::InStack) => {
                    let pos = stack.iter().position(|&n| n == neighbor).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[pos..].iter().map(|&s| s.to_owned()).collect();
                    cycle.push(neighbor.to_owned());
                    return Some(cycle);
                }
                Some(DfsState::Unvisited) | None => {
                    if let Some(cycle) = dfs(neighbor, adj, state, stack) {
                        return Some(cycle);
                    }
                }
                Some(DfsState::Done) => {}
            }
        }
    }

    stack.pop();
    state.insert(node, DfsState::Done);
    None
}
