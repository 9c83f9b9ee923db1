use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
    /// A required field is empty.
    #[error("`{0}` cannot be empty")]
    EmptyField(String),
    /// A field holds a value outside of its accepted range.
    #[error("Invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
    /// A list contains the same entry more than once.
    #[error("`{field}` contains `{value}` more than once")]
    DuplicateEntry { field: String, value: String },
    /// A variable the source does not serve.
    #[error("Unknown source variable `{0}`")]
    UnknownVariable(String),
}
