/// Convenience result type used across letterpress.
pub type LetterpressResult<T> = Result<T, LetterpressError>;

/// Top-level error taxonomy used by the library APIs.
#[derive(thiserror::Error, Debug)]
pub enum LetterpressError {
    /// Invalid user-provided input (ratio strings, colours, oversized files, font containers).
    #[error("validation error: {0}")]
    Validation(String),

    /// Image or font bytes that could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Internal render invariant violations (buffer sizes, surface limits).
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LetterpressError {
    /// Build a [`LetterpressError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LetterpressError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`LetterpressError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`LetterpressError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for errors a user can act on (shown as a notice rather than a failure).
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Decode(_))
    }
}

impl From<serde_json::Error> for LetterpressError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
