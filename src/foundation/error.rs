/// Convenience result type used across the crate.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Top-level error taxonomy used by viewer APIs.
///
/// None of these are fatal to a running viewer: the tick path converts them into a
/// [`crate::ViewerEvent::Warning`] and a placeholder frame.
#[derive(thiserror::Error, Debug)]
pub enum OverlayError {
    /// Invalid user-provided options or scene data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Failures opening or decoding an image source.
    #[error("source error: {0}")]
    Source(String),

    /// Failures while rasterizing or compositing a surface.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OverlayError {
    /// Build a [`OverlayError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`OverlayError::Source`] value.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Build a [`OverlayError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`OverlayError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
