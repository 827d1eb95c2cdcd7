/// Convenience result type used across vidmaster.
pub type VidmasterResult<T> = Result<T, VidmasterError>;

/// Error taxonomy for parsing and executing scripts.
///
/// Every variant is fatal to a run: the workbench stops at the first error and does not undo
/// side effects (files already written by earlier exports stay on disk).
#[derive(thiserror::Error, Debug)]
pub enum VidmasterError {
    /// A script line does not follow the `key = value` grammar, or a value cannot be coerced.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based script line.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A block is missing an attribute its operation requires.
    #[error("missing field '{field}' in '{kind}' block at line {line}")]
    MissingField {
        /// Block kind token (`define`, `resize`, ...).
        kind: String,
        /// Script attribute name.
        field: String,
        /// 1-based line of the block's opening marker.
        line: usize,
    },

    /// Unrecognized block kind or media type token.
    #[error("unknown kind '{token}' at line {line}")]
    UnknownKind {
        /// The offending token.
        token: String,
        /// 1-based script line.
        line: usize,
    },

    /// A clip name was used before any operation produced it.
    #[error("undefined clip '{name}' referenced by '{kind}' block at line {line}")]
    UndefinedReference {
        /// The unresolved clip name.
        name: String,
        /// Block kind of the referencing operation.
        kind: String,
        /// 1-based line of the referencing block.
        line: usize,
    },

    /// Failure reported by the media backend.
    #[error("backend error: {0}")]
    Backend(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VidmasterError {
    /// Build a [`VidmasterError::Parse`] value.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Build a [`VidmasterError::MissingField`] value.
    pub fn missing_field(kind: impl Into<String>, field: impl Into<String>, line: usize) -> Self {
        Self::MissingField {
            kind: kind.into(),
            field: field.into(),
            line,
        }
    }

    /// Build a [`VidmasterError::UnknownKind`] value.
    pub fn unknown_kind(token: impl Into<String>, line: usize) -> Self {
        Self::UnknownKind {
            token: token.into(),
            line,
        }
    }

    /// Build a [`VidmasterError::UndefinedReference`] value.
    pub fn undefined_reference(
        name: impl Into<String>,
        kind: impl Into<String>,
        line: usize,
    ) -> Self {
        Self::UndefinedReference {
            name: name.into(),
            kind: kind.into(),
            line,
        }
    }

    /// Build a [`VidmasterError::Backend`] value.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
