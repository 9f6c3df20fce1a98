//! Envelope error model.

use thiserror::Error;

/// Result type used across the envelope crates.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// Envelope-level error.
///
/// `Validation` is the distinguished, data-correctable kind: everything a
/// producer or consumer can fix by changing attribute values lands there.
/// The remaining variants are programmer errors or typed-data failures.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// An envelope or transport message failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A required argument was empty.
    #[error("argument must not be empty: {0}")]
    InvalidArgument(&'static str),

    /// A structured-mode media type this crate cannot parse.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The cached typed data has a different type than the one requested.
    #[error("cached data cannot be cast to `{requested}`")]
    Cast { requested: &'static str },

    /// The envelope carries no data to deserialize.
    #[error("envelope has no data")]
    MissingData,

    /// Typed data could not be (de)serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Typed data could not be (de)serialized as XML.
    #[error("xml data error: {0}")]
    Xml(String),

    /// The process-wide default binding was already fixed.
    #[error("default protocol binding is already set")]
    DefaultBindingAlreadySet,

    /// No envelope kind is registered under this tag.
    #[error("unknown envelope kind: {0}")]
    UnknownKind(String),

    /// A binding name that does not match a built-in binding.
    #[error("unknown protocol binding: {0}")]
    UnknownBinding(String),

    /// A configuration value could not be interpreted.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EnvelopeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unsupported_media_type(media_type: impl Into<String>) -> Self {
        Self::UnsupportedMediaType(media_type.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn xml(err: impl core::fmt::Display) -> Self {
        Self::Xml(err.to_string())
    }

    pub fn cast<T>() -> Self {
        Self::Cast {
            requested: core::any::type_name::<T>(),
        }
    }

    /// Whether this is the data-correctable validation kind.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_carry_the_reason() {
        let err = EnvelopeError::validation("missing 'source' header");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "validation failed: missing 'source' header");
    }

    #[test]
    fn cast_error_names_the_requested_type() {
        let err = EnvelopeError::cast::<u32>();
        assert!(!err.is_validation());
        assert!(err.to_string().contains("u32"));
    }
}
