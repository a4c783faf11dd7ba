use std::fmt;
use std::time::Duration;

use super::match_result::MatchResult;

/// Detailed evaluation report returned by
/// [`RuleSet::evaluate_detailed()`](super::ruleset::RuleSet::evaluate_detailed).
///
/// Contains the match, which rules were checked before evaluation stopped,
/// which of those faulted, and the wall-clock duration of the evaluation.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    matched: Option<MatchResult>,
    checked: Vec<String>,
    faulted: Vec<String>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(
        matched: Option<MatchResult>,
        checked: Vec<String>,
        faulted: Vec<String>,
        duration: Duration,
    ) -> Self {
        Self {
            matched,
            checked,
            faulted,
            duration,
        }
    }

    /// The match, same as [`RuleSet::evaluate()`](super::ruleset::RuleSet::evaluate).
    #[must_use]
    pub fn matched(&self) -> Option<&MatchResult> {
        self.matched.as_ref()
    }

    /// Ids of the rules whose conditions were evaluated, in priority order.
    /// The last entry is the matching rule when there is a match.
    #[must_use]
    pub fn checked(&self) -> &[String] {
        &self.checked
    }

    /// Ids of rules whose evaluation faulted and were treated as not matching.
    #[must_use]
    pub fn faulted(&self) -> &[String] {
        &self.faulted
    }

    /// Wall-clock duration of the evaluation.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matched {
            Some(m) => write!(f, "match: {m}")?,
            None => write!(f, "match: none")?,
        }
        write!(f, ", checked: [{}]", self.checked.join(", "))?;
        if !self.faulted.is_empty() {
            write!(f, ", faulted: [{}]", self.faulted.join(", "))?;
        }
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field, Rule};

    fn matched() -> MatchResult {
        MatchResult::from_rule(&Rule {
            id: "R2".into(),
            name: String::new(),
            priority: 2,
            active: true,
            conditions: field("x").eq(1_i64),
            message_ref: "M2".into(),
            placeholders: vec![],
            tags: vec![],
            sub_rules: vec![],
        })
    }

    #[test]
    fn report_accessors() {
        let report = EvaluationReport::new(
            Some(matched()),
            vec!["R1".into(), "R2".into()],
            vec!["R1".into()],
            Duration::from_nanos(500),
        );

        assert_eq!(report.matched().map(|m| m.rule_id.as_str()), Some("R2"));
        assert_eq!(report.checked(), &["R1", "R2"]);
        assert_eq!(report.faulted(), &["R1"]);
        assert_eq!(report.duration(), Duration::from_nanos(500));
    }

    #[test]
    fn report_display_with_match() {
        let report = EvaluationReport::new(
            Some(matched()),
            vec!["R1".into(), "R2".into()],
            vec![],
            Duration::from_nanos(500),
        );
        let s = report.to_string();
        assert!(s.contains("match: R2 -> M2"));
        assert!(s.contains("checked: [R1, R2]"));
        assert!(!s.contains("faulted"));
    }

    #[test]
    fn report_display_no_match() {
        let report =
            EvaluationReport::new(None, vec!["R1".into()], vec![], Duration::from_nanos(100));
        assert!(report.to_string().contains("match: none"));
    }
}
