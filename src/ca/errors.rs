use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by the certificate authority.
#[derive(Error, Debug)]
pub enum CaError {
    /// Caller supplied data was rejected before any external call.
    #[error("{0}")]
    Validation(String),

    #[error("command \"{command}\" did not complete successfully (exit code {exit_code:?}): {output}")]
    ExternalTool {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("command \"{command}\" did not finish within {timeout:?}")]
    ToolTimeout { command: String, timeout: Duration },

    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error("unable to parse certificate: {0}")]
    Parse(String),

    /// The legacy CA could not be imported. The canonical store is left
    /// uninitialised and bootstrap is not attempted.
    #[error("migration of legacy CA failed: {0}")]
    Migration(#[source] Box<CaError>),

    #[error("{0}")]
    Unsupported(&'static str),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            CaError::NotFound(path)
        } else {
            CaError::Io { path, source }
        }
    }

    /// Short machine readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CaError::Validation(_) => "validation",
            CaError::ExternalTool { .. } => "external_tool",
            CaError::ToolTimeout { .. } => "tool_timeout",
            CaError::NotFound(_) => "not_found",
            CaError::Parse(_) => "parse",
            CaError::Migration(_) => "migration",
            CaError::Unsupported(_) => "unsupported",
            CaError::Io { .. } => "io",
        }
    }

    /// Output captured from the failing tool, if any.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            CaError::ExternalTool { output, .. } => Some(output),
            CaError::Migration(inner) => inner.tool_output(),
            _ => None,
        }
    }
}

pub type CaResult<T> = Result<T, CaError>;
