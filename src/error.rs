use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced by the wrapper and its collaborators.
///
/// Fingerprint-store failures never appear here; that layer degrades
/// silently to "absent" (see [`crate::MetadataStore`]).
#[derive(Debug, Error)]
pub enum DependsError {
    /// A path that was required to exist does not.
    #[error("path not found: {0}")]
    NotFound(Utf8PathBuf),

    #[error("couldn't stat '{path}'")]
    Stat {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't touch '{path}'")]
    Touch {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The invocation's arguments cannot be bound to the declared
    /// parameters. A usage error, not an environmental one.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// The wrapped task body failed. Propagated unchanged, with no output
    /// bookkeeping performed, so the next invocation re-runs.
    #[error("Task '{0}':\n{1}")]
    Body(String, #[source] anyhow::Error),
}

/// Why an invocation could not be bound to a task's declared parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("unknown named argument '{0}'")]
    UnknownArgument(String),

    #[error("parameter '{0}' bound twice")]
    DuplicateArgument(String),

    #[error("too many positional arguments: expected at most {expected}, got {got}")]
    TooManyPositional { expected: usize, got: usize },
}
