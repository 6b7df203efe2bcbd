//! Local validation errors, raised before any network call is made.

/// Errors produced when validating input against the data model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required id was empty
    #[error("{0} must not be empty")]
    EmptyId(&'static str),

    /// A status value outside the fixed enumeration
    #[error("invalid task status: {0:?}")]
    UnknownStatus(String),

    /// A session state outside the fixed enumeration
    #[error("invalid session state: {0:?}")]
    UnknownSessionState(String),

    /// API key missing
    #[error("API key is required")]
    MissingApiKey,

    /// API key present but not in the expected format
    #[error("invalid API key format: expected ap_user_ or ap_team_ prefix followed by at least {min} characters")]
    MalformedApiKey {
        /// Minimum number of characters after the prefix
        min: usize,
    },
}
