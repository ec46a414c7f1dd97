//! Error types shared across the crate.
//!
//! Per-file problems (unreadable files, malformed expressions inside a
//! file's header) are recorded as data on that file's metadata and never
//! abort a scan; the variants here cover operations that fail as a whole.

use thiserror::Error;

use crate::comment::StyleError;
use crate::expression::ParseError;
use crate::header::TemplateError;

/// Result type alias for lintel operations.
pub type Result<T> = std::result::Result<T, LintelError>;

#[derive(Error, Debug)]
pub enum LintelError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Style(#[from] StyleError),

    #[error("{0}")]
    Template(#[from] TemplateError),

    /// Malformed external input (coverage declaration, lintel.toml).
    /// Fatal: silently ignoring a coverage declaration could invert the
    /// header-wins precedence.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LintelError {
    /// Create a configuration error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
