//! Error types and handling infrastructure for xractions.
//!
//! Every fallible operation returns [`Result`]. Errors reported by the input
//! runtime travel through the action layer unmodified: the variant a caller
//! sees is the one the runtime produced.
//!
//! ## Taxonomy
//!
//! - **Resolution**: a path or profile string cannot be turned into a
//!   [`Path`](crate::runtime::Path) (`PathFormatInvalid`, `PathUnsupported`)
//! - **Creation**: the runtime rejects an action set or action (`NameInvalid`,
//!   `NameDuplicated`, ...)
//! - **Protocol**: suggest/attach/sync calls are rejected (`ActionSetsAlreadyAttached`,
//!   `ActionSetNotAttached`, `ValidationFailure`, ...)
//! - **Manifest**: configuration loading (`Config`, `Io`)

use thiserror::Error;

/// The main error type for xractions operations.
#[derive(Error, Debug)]
pub enum XrError {
    /// Parameters of a runtime call failed validation
    #[error("Validation failure: {message}")]
    ValidationFailure { message: String },

    /// A handle passed to the runtime is unknown or already destroyed
    #[error("Invalid {kind} handle")]
    HandleInvalid { kind: &'static str },

    /// A path string is not well-formed
    #[error("Path format invalid: {path}")]
    PathFormatInvalid { path: String },

    /// A well-formed path is not valid in the position it was used
    #[error("Path unsupported: {path}")]
    PathUnsupported { path: String },

    /// Action set or action name is empty, too long or uses illegal characters
    #[error("Name invalid: {name:?}")]
    NameInvalid { name: String },

    /// Action set or action name already used in the same scope
    #[error("Name duplicated: {name}")]
    NameDuplicated { name: String },

    /// Localized name is empty
    #[error("Localized name invalid: {name:?}")]
    LocalizedNameInvalid { name: String },

    /// Localized name already used in the same scope
    #[error("Localized name duplicated: {name}")]
    LocalizedNameDuplicated { name: String },

    /// Action sets were already attached to the session
    #[error("Action sets already attached to the session")]
    ActionSetsAlreadyAttached,

    /// An action set used in a sync was never attached to the session
    #[error("Action set not attached: {name}")]
    ActionSetNotAttached { name: String },

    /// The session cannot accept the call in its current state
    #[error("Session not running")]
    SessionNotRunning,

    /// Any other runtime result code, mapped by the backend
    #[error("Runtime call failed ({code}): {message}")]
    Runtime { code: i32, message: String },

    /// Action manifest errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Reading a manifest from disk failed
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Standard Result type for xractions operations.
pub type Result<T> = std::result::Result<T, XrError>;

impl XrError {
    /// Create a ValidationFailure with a descriptive message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailure {
            message: message.into(),
        }
    }

    /// Create a Config error with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Numeric runtime result code for this error.
    ///
    /// Values follow the OpenXR `XrResult` numbering. Errors that never come
    /// from a runtime (`Config`, `Io`) report `XR_ERROR_RUNTIME_FAILURE` (-2).
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationFailure { .. } => -1,
            Self::HandleInvalid { .. } => -12,
            Self::SessionNotRunning => -16,
            Self::PathFormatInvalid { .. } => -21,
            Self::PathUnsupported { .. } => -22,
            Self::NameDuplicated { .. } => -44,
            Self::NameInvalid { .. } => -45,
            Self::ActionSetNotAttached { .. } => -46,
            Self::ActionSetsAlreadyAttached => -47,
            Self::LocalizedNameDuplicated { .. } => -48,
            Self::LocalizedNameInvalid { .. } => -49,
            Self::Runtime { code, .. } => *code,
            Self::Config { .. } | Self::Io(_) => -2,
        }
    }
}
