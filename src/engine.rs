//! The hot-reloadable front door: an immutable [`Snapshot`] of rules and
//! message templates behind an atomically swapped pointer.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{info, warn};

use crate::message::{MessageCatalog, RenderedMessage};
use crate::{
    CompileError, Context, DataSources, MatchResult, RoutebookError, Rule, RuleConfig, RuleSet,
    RuleSummary, Warning,
};

/// Outcome of routing one request end to end.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A rule matched and its message template resolved.
    Answered {
        matched: MatchResult,
        message: RenderedMessage,
    },
    /// A rule matched but no template is stored under its `message_ref`.
    MissingMessage(MatchResult),
    /// No rule matched. Choosing a fallback reply is up to the caller.
    NoMatch,
}

/// Everything one evaluation reads. Never mutated after construction.
#[derive(Debug)]
pub struct Snapshot {
    rules: RuleSet,
    messages: MessageCatalog,
    warnings: Vec<Warning>,
}

impl Snapshot {
    #[must_use]
    pub fn new(rules: RuleSet, messages: MessageCatalog) -> Self {
        let mut warnings = rules.warnings().to_vec();
        for rule in rules.rules() {
            let refs = std::iter::once((rule.id.as_str(), rule.message_ref.as_str())).chain(
                rule.sub_rules
                    .iter()
                    .filter_map(|s| Some((s.id.as_str(), s.message_ref.as_deref()?))),
            );
            for (owner, message_ref) in refs {
                if !messages.contains(message_ref) {
                    let warning = Warning::MissingMessage {
                        owner: owner.to_owned(),
                        message_ref: message_ref.to_owned(),
                    };
                    warn!(%warning, "rule configuration warning");
                    warnings.push(warning);
                }
            }
        }
        Self {
            rules,
            messages,
            warnings,
        }
    }

    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    #[must_use]
    pub fn messages(&self) -> &MessageCatalog {
        &self.messages
    }

    /// Compile-time warnings plus rules pointing at missing templates.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    #[must_use]
    pub fn evaluate(&self, ctx: &Context, ds: &DataSources) -> Option<MatchResult> {
        self.rules.evaluate(ctx, ds)
    }

    #[must_use]
    pub fn resolve(
        &self,
        message_ref: &str,
        ctx: &Context,
        ds: &DataSources,
    ) -> Option<RenderedMessage> {
        self.messages.resolve(message_ref, ctx, ds)
    }

    #[must_use]
    pub fn answer(&self, ctx: &Context, ds: &DataSources) -> Outcome {
        let Some(matched) = self.evaluate(ctx, ds) else {
            return Outcome::NoMatch;
        };
        match self.resolve(&matched.message_ref, ctx, ds) {
            Some(message) => Outcome::Answered { matched, message },
            None => Outcome::MissingMessage(matched),
        }
    }
}

/// Shared routing engine.
///
/// Readers take the current [`Snapshot`] with one atomic load; reloads build
/// a complete new snapshot and publish it with one atomic store, so every
/// call sees either the old rules and messages or the new ones.
///
/// # Example
///
/// ```
/// use routebook::{Context, DataSources, Engine, MessageCatalog, Outcome, RuleSet};
///
/// let rules = RuleSet::from_json(r#"{
///     "rules": [{"id": "R1", "priority": 1, "conditions": {"field": "State", "val": "VA"},
///                "message_ref": "VIRGINIA"}]
/// }"#).unwrap();
/// let messages = MessageCatalog::new().with("VIRGINIA", "Hello from {{State}}");
/// let engine = Engine::new(rules, messages);
///
/// let ctx = Context::new().set("State", "VA");
/// match engine.answer(&ctx, &DataSources::new()) {
///     Outcome::Answered { message, .. } => assert_eq!(message.markdown, "Hello from VA"),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
#[derive(Debug)]
pub struct Engine {
    current: ArcSwap<Snapshot>,
}

impl Engine {
    #[must_use]
    pub fn new(rules: RuleSet, messages: MessageCatalog) -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::new(rules, messages)),
        }
    }

    /// Load a JSON rule file and a directory of Markdown templates.
    ///
    /// # Errors
    ///
    /// Returns [`RoutebookError`] on I/O, parse, or compile failure.
    pub fn from_paths(
        rules_path: impl AsRef<Path>,
        messages_dir: impl AsRef<Path>,
    ) -> Result<Self, RoutebookError> {
        let rules = RuleSet::from_file(rules_path)?;
        let messages = MessageCatalog::from_dir(messages_dir)?;
        Ok(Self::new(rules, messages))
    }

    /// The snapshot currently being served. Holding it keeps it alive across
    /// reloads.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    #[must_use]
    pub fn evaluate(&self, ctx: &Context, ds: &DataSources) -> Option<MatchResult> {
        self.current.load().evaluate(ctx, ds)
    }

    #[must_use]
    pub fn resolve(
        &self,
        message_ref: &str,
        ctx: &Context,
        ds: &DataSources,
    ) -> Option<RenderedMessage> {
        self.current.load().resolve(message_ref, ctx, ds)
    }

    /// Evaluate and resolve against a single snapshot.
    #[must_use]
    pub fn answer(&self, ctx: &Context, ds: &DataSources) -> Outcome {
        self.current.load().answer(ctx, ds)
    }

    /// Compile `config` and publish it together with `messages`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if the configuration is rejected; the
    /// previous snapshot stays in service.
    pub fn reload(&self, config: RuleConfig, messages: MessageCatalog) -> Result<(), CompileError> {
        let rules = RuleSet::from_config(config).inspect_err(|e| {
            warn!(error = %e, "reload rejected, keeping previous snapshot");
        })?;
        self.publish(Snapshot::new(rules, messages));
        Ok(())
    }

    /// Replace the rules, keeping the current message templates.
    ///
    /// # Errors
    ///
    /// Same as [`reload`](Self::reload).
    pub fn reload_rules(&self, config: RuleConfig) -> Result<(), CompileError> {
        let messages = self.current.load().messages.clone();
        self.reload(config, messages)
    }

    /// Re-read both the rule file and the message directory.
    ///
    /// Unlike [`from_paths`](Self::from_paths), a missing message directory
    /// is an error here.
    ///
    /// # Errors
    ///
    /// Returns [`RoutebookError`] on I/O, parse, or compile failure; the
    /// previous snapshot stays in service.
    pub fn reload_from_paths(
        &self,
        rules_path: impl AsRef<Path>,
        messages_dir: impl AsRef<Path>,
    ) -> Result<(), RoutebookError> {
        let loaded = RuleSet::from_file(rules_path).and_then(|rules| {
            let messages = MessageCatalog::from_existing_dir(messages_dir)?;
            Ok((rules, messages))
        });
        match loaded {
            Ok((rules, messages)) => {
                self.publish(Snapshot::new(rules, messages));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "reload rejected, keeping previous snapshot");
                Err(e)
            }
        }
    }

    fn publish(&self, snapshot: Snapshot) {
        info!(
            rules = snapshot.rules.len(),
            messages = snapshot.messages.len(),
            warnings = snapshot.warnings.len(),
            "published snapshot"
        );
        self.current.store(Arc::new(snapshot));
    }

    /// Active rules in evaluation order.
    #[must_use]
    pub fn list_rules(&self) -> Vec<RuleSummary> {
        self.current.load().rules.list_rules()
    }

    #[must_use]
    pub fn get_rule_by_id(&self, id: &str) -> Option<Rule> {
        self.current.load().rules.get_rule_by_id(id).cloned()
    }

    /// Message template names, sorted.
    #[must_use]
    pub fn list_template_names(&self) -> Vec<String> {
        self.current
            .load()
            .messages
            .names()
            .map(str::to_owned)
            .collect()
    }

    #[must_use]
    pub fn warnings(&self) -> Vec<Warning> {
        self.current.load().warnings.clone()
    }
}
