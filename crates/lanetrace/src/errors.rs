use thiserror::Error;

/// Error produced when loading a [`crate::TraceConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration source could not be read or deserialized
    #[error("error loading trace configuration: {0}")]
    Load(#[from] config::ConfigError),
    /// Indentation unit contains a line break
    ///
    /// Indentation is repeated at the start of every line, so a line break
    /// inside it would split lines and misalign lanes.
    #[error("indentation unit {0:?} must not contain line breaks")]
    MultilineIndent(String),
}
