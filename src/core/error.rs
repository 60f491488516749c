/// Result type alias for autotest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for autotest.
///
/// These are framework errors (bad configuration, a server that fails to
/// bind). Failures of the tests themselves are [`Failure`](crate::Failure)
/// values and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Web surface errors.
    #[error("Web error: {0}")]
    Web(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidConfig { field: String, value: String },

    /// Feature not enabled.
    #[error("Feature '{0}' is not enabled. Enable it in Cargo.toml features.")]
    FeatureNotEnabled(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error.
    #[error("TOML parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a web error.
    pub fn web(msg: impl Into<String>) -> Self {
        Error::Web(msg.into())
    }

    /// Create an invalid configuration value error.
    pub fn invalid_config(field: impl Into<String>, value: impl Into<String>) -> Self {
        Error::InvalidConfig {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a feature not enabled error.
    pub fn feature_not_enabled(feature: impl Into<String>) -> Self {
        Error::FeatureNotEnabled(feature.into())
    }
}
