use thiserror::Error;

use crate::engine::word::ResolveError;

/// Exit status of a child killed by signal `n` is `SIGNAL_STATUS_BASE + n`.
pub const SIGNAL_STATUS_BASE: i32 = 128;

/// Program found but could not be executed.
pub const STATUS_CANNOT_EXEC: i32 = 126;

/// Program not found on PATH.
pub const STATUS_NOT_FOUND: i32 = 127;

/// Everything that can go wrong while executing a command tree.
///
/// The engine never retries and nothing here is fatal to it: every error
/// collapses into an exit status (see [`EngineError::status`]) that flows up
/// through the operator combinators.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Resolution(#[from] ResolveError),

    /// A redirection target could not be opened or bound.
    #[error("cannot redirect to {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("{0}: command not found")]
    NotFound(String),

    /// Program exists but the exec itself failed.
    #[error("cannot execute {program}: {source}")]
    Launch {
        program: String,
        source: nix::Error,
    },

    /// A builtin (`cd`, assignment) failed without touching process state.
    #[error("{0}")]
    Builtin(String),

    /// fork/wait/pipe failure.
    #[error("process error: {0}")]
    Process(#[from] nix::Error),
}

impl EngineError {
    /// The exit status this failure contributes to the tree.
    pub fn status(&self) -> i32 {
        match self {
            EngineError::NotFound(_) => STATUS_NOT_FOUND,
            EngineError::Launch { .. } => STATUS_CANNOT_EXEC,
            EngineError::Resolution(_)
            | EngineError::Io { .. }
            | EngineError::Builtin(_)
            | EngineError::Process(_) => 1,
        }
    }
}
