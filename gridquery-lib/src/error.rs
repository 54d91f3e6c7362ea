//! Error types

/// Errors that can occur while decoding table state from a URL query string.
///
/// Decoding is strict: a filter value that is not valid JSON, a `page`/`size`
/// that is not a positive integer, or an unrecognized filter type tag all
/// surface as errors instead of being silently dropped. The caller decides
/// whether to abort or fall back to defaults.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A filter value in the URL was not valid JSON.
    #[error("invalid filter value for '{key}': {source}")]
    FilterValue {
        /// Column key the value belongs to.
        key: String,
        /// The underlying JSON parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A reserved numeric parameter (`page`, `size`) failed to parse.
    #[error("invalid number for '{key}': {value}")]
    Number {
        /// Parameter name.
        key: String,
        /// Raw string value from the URL.
        value: String,
    },

    /// A `<key>_type` parameter carried an unknown filter type tag.
    #[error("unknown filter type: {0}")]
    FilterType(String),
}

impl DecodeError {
    /// Creates a filter value error for the given column key.
    pub fn filter_value(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::FilterValue {
            key: key.into(),
            source,
        }
    }

    /// Creates a numeric parameter error.
    pub fn number(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Number {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Error returned by an async select-option provider.
///
/// Providers are external collaborators (usually a lookup against the same
/// backend the table is bound to), so the engine only carries an opaque
/// message. Provider failures are logged and never propagate past the
/// option loader.
#[derive(Debug, thiserror::Error)]
#[error("option provider error: {message}")]
pub struct OptionsError {
    message: String,
}

impl OptionsError {
    /// Creates a new provider error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
