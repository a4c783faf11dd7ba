//! The persisted rule configuration contract.
//!
//! ```json
//! {
//!   "rules": [ { "id": "...", "priority": 10, "conditions": {...}, "message_ref": "..." } ],
//!   "condition_templates": { "is_member": { "field": "HCCustomerType", "op": "eq", "val": "Member" } },
//!   "data_sources": { "fehbp_address": { "...": "..." } }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Condition, Rule, RoutebookError};

/// Parsed, uncompiled rule configuration.
///
/// Compile it with [`RuleSet::from_config`](crate::RuleSet::from_config) or
/// hand it to [`Engine::reload`](crate::Engine::reload).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub condition_templates: BTreeMap<String, Condition>,
    /// Descriptions of the external data sources. Opaque to evaluation.
    #[serde(default)]
    pub data_sources: BTreeMap<String, serde_json::Value>,
}

impl RuleConfig {
    /// Parse configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`RoutebookError::Config`] if the text is not valid JSON or does
    /// not match the configuration schema.
    pub fn from_json(input: &str) -> Result<Self, RoutebookError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Convert an already-parsed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`RoutebookError::Config`] if the document does not match the
    /// configuration schema.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RoutebookError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Read and parse a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`RoutebookError`] on I/O or parse failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RoutebookError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_json(&input)
    }

    /// Serialize back to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RoutebookError::Config`] if serialization fails.
    pub fn to_json(&self) -> Result<String, RoutebookError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
