/// Convenience result alias used across the crate.
pub type PathreelResult<T> = Result<T, PathreelError>;

/// Library error taxonomy.
///
/// `Validation` errors are raised synchronously at API boundaries (submit, settings parsing).
/// `Capability` errors are normally absorbed by export tier fallback. `Encoding` errors carry
/// the underlying encoder message so it can be surfaced through job status.
#[derive(thiserror::Error, Debug)]
pub enum PathreelError {
    /// Invalid input (no routes, missing background, malformed settings).
    #[error("validation error: {0}")]
    Validation(String),

    /// A required rasterizer or encoder is unavailable.
    #[error("capability error: {0}")]
    Capability(String),

    /// The external encoder failed, timed out, or was torn down.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Rasterization failed for a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Unknown job id, or an artifact that is not available yet.
    #[error("not found: {0}")]
    NotFound(String),

    /// JSON / TOML (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// The job was cancelled before it finished.
    #[error("export cancelled")]
    Cancelled,

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all carrying context chains built with `anyhow::Context`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PathreelError {
    /// Build a [`PathreelError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PathreelError::Capability`].
    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability(msg.into())
    }

    /// Build a [`PathreelError::Encoding`].
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Build a [`PathreelError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PathreelError::NotFound`].
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`PathreelError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors produced by input validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Return `true` when work stopped because of a cancellation request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Return `true` for unknown-id / missing-artifact errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for PathreelError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
