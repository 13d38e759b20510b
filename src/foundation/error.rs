/// Convenience result type used across flipbook.
pub type FlipbookResult<T> = Result<T, FlipbookError>;

/// Top-level error taxonomy used by resolver, timeline and frame controller APIs.
#[derive(thiserror::Error, Debug)]
pub enum FlipbookError {
    /// Disallowed protocol, malformed manifest shape, or frame count over the cap.
    #[error("validation error: {0}")]
    Validation(String),

    /// Non-success response, wrong content type, or transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// A fetch exceeded its time budget.
    #[error("timeout error: {0}")]
    Timeout(String),

    /// A single frame failed to load or decode.
    #[error("load error: {0}")]
    Load(String),

    /// The drawing surface could not be acquired.
    #[error("context error: {0}")]
    Context(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlipbookError {
    /// Build a [`FlipbookError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FlipbookError::Network`] value.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Build a [`FlipbookError::Timeout`] value.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Build a [`FlipbookError::Load`] value.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Build a [`FlipbookError::Context`] value.
    pub fn context(msg: impl Into<String>) -> Self {
        Self::Context(msg.into())
    }

    /// Build a [`FlipbookError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors that a caller may reasonably retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

// Memoized manifest results are handed to every waiter, so the error must be cloneable.
// `anyhow::Error` is not, which leaves `Other` to be cloned by its rendered message.
impl Clone for FlipbookError {
    fn clone(&self) -> Self {
        match self {
            Self::Validation(m) => Self::Validation(m.clone()),
            Self::Network(m) => Self::Network(m.clone()),
            Self::Timeout(m) => Self::Timeout(m.clone()),
            Self::Load(m) => Self::Load(m.clone()),
            Self::Context(m) => Self::Context(m.clone()),
            Self::Serde(m) => Self::Serde(m.clone()),
            Self::Other(e) => Self::Other(anyhow::anyhow!("{e:#}")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
