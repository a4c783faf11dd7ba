use thiserror::Error;

use crate::CompileError;

/// Unified error type covering configuration parsing, compilation, and I/O.
///
/// Returned by loaders like [`RuleSet::from_json()`](crate::RuleSet::from_json),
/// [`RuleSet::from_file()`](crate::RuleSet::from_file) and
/// [`Engine::from_paths()`](crate::Engine::from_paths).
#[derive(Debug, Error)]
pub enum RoutebookError {
    #[error("invalid rule configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
