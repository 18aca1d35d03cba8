//! Error types.

use crate::domain::identity::IdentityParseError;
use crate::domain::label::Label;

/// Native failures of the tabular engine.
///
/// `KeyNotFound` is the one legacy callers match on; the compatibility layer
/// hands it back exactly as the engine produced it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("KeyError: {0}")]
    KeyNotFound(Label),

    #[error("position {position} is out of bounds for length {len}")]
    PositionOutOfBounds { position: i64, len: usize },

    #[error("level {level} out of range for index with {nlevels} level(s)")]
    LevelOutOfRange { level: usize, nlevels: usize },

    #[error("index contains duplicate entries, cannot reshape")]
    DuplicateEntries,

    #[error("{op} is not supported for dtype {dtype}")]
    TypeMismatch { op: String, dtype: String },

    #[error("invalid argument for {op}: {reason}")]
    InvalidArgument { op: String, reason: String },

    #[error("unknown operation {0:?}")]
    UnknownOperation(String),

    /// Failure reported by the underlying dataframe library.
    #[error("engine error: {0}")]
    Engine(String),
}

impl FrameError {
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, FrameError::KeyNotFound(_))
    }
}

/// Top-level error type for tickframe.
#[derive(Debug, thiserror::Error)]
pub enum TickframeError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("schema mismatch in column {column}: expected {expected}, found {found}")]
    SchemaMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    IdentityParse(#[from] IdentityParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
