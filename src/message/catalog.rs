use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::placeholder::substitute;
use super::render::render_markdown;
use crate::{Context, DataSources, RoutebookError};

/// A resolved message: the substituted Markdown and its HTML rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub markdown: String,
    pub html: String,
}

/// Message templates keyed by name, bodies stored without frontmatter.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    templates: BTreeMap<String, String>,
}

impl MessageCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a template. A leading `---` frontmatter block is
    /// dropped and the body trimmed.
    #[must_use]
    pub fn with(mut self, name: &str, content: &str) -> Self {
        self.insert(name, content);
        self
    }

    pub fn insert(&mut self, name: &str, content: &str) {
        self.templates
            .insert(name.to_owned(), strip_frontmatter(content).to_owned());
    }

    /// Load every `*.md` file in `dir`, keyed by file stem.
    ///
    /// A missing directory yields an empty catalog. Files that cannot be
    /// read are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RoutebookError::Io`] if the directory exists but cannot be
    /// listed.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, RoutebookError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            warn!(path = %dir.display(), "message directory not found");
            return Ok(Self::new());
        }
        Self::from_existing_dir(dir)
    }

    /// Like [`from_dir`](Self::from_dir), but a missing directory is an
    /// error. Used when replacing a catalog that is already serving.
    ///
    /// # Errors
    ///
    /// Returns [`RoutebookError::Io`] if the directory does not exist or
    /// cannot be listed.
    pub fn from_existing_dir(dir: impl AsRef<Path>) -> Result<Self, RoutebookError> {
        let dir = dir.as_ref();
        let mut catalog = Self::new();

        for entry in std::fs::read_dir(dir)?.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "md") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!(path = %path.display(), "skipping message file with non UTF-8 name");
                continue;
            };
            match std::fs::read_to_string(&path) {
                Ok(content) => catalog.insert(name, &content),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping message file"),
            }
        }

        info!(path = %dir.display(), templates = catalog.len(), "loaded message templates");
        Ok(catalog)
    }

    /// Stored body of a template.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Template names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Substitute placeholders in `message_ref` and render it.
    ///
    /// Returns `None` when no template has that name.
    #[must_use]
    pub fn resolve(
        &self,
        message_ref: &str,
        ctx: &Context,
        ds: &DataSources,
    ) -> Option<RenderedMessage> {
        let Some(template) = self.templates.get(message_ref) else {
            warn!(message_ref, "message template not found");
            return None;
        };
        let markdown = substitute(template, ctx, ds);
        let html = render_markdown(&markdown);
        debug!(message_ref, bytes = markdown.len(), "resolved message");
        Some(RenderedMessage { markdown, html })
    }
}

/// Strip a frontmatter block opened by a first line of exactly `---` and
/// closed by the next such line. Without a closing line nothing is stripped.
fn strip_frontmatter(content: &str) -> &str {
    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return content.trim();
    };
    if first.trim_end() != "---" {
        return content.trim();
    }
    let mut offset = first.len();
    for line in lines {
        offset += line.len();
        if line.trim_end() == "---" {
            return content[offset..].trim();
        }
    }
    content.trim()
}
