//! Crate-level error type.
//!
//! Only startup failures (missing script, malformed template, unreadable
//! solution manifest) propagate out of `main`. Everything else is reported
//! through `tracing` and degraded to best-effort behavior.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("script not found: {0}")]
    ScriptNotFound(PathBuf),

    #[error("template syntax error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("template evaluation failed: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("solution manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
