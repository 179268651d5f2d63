//! Error types and result aliases for Comet operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the Comet crates with actionable error messages.

use thiserror::Error;

/// Unified error type for all Comet operations
#[derive(Error, Debug)]
pub enum CometError {
    // Descriptor errors
    #[error("Failed to parse package.toml: {message}")]
    DescriptorParse { message: String },

    #[error("Package '{package}' may have only one {role} handler")]
    DuplicateRoleHandler { package: String, role: String },

    #[error("Package '{package}' has already registered a handler for '.{extension}'")]
    DuplicateExtension { package: String, extension: String },

    #[error("Vendor dependencies may be declared only once in package '{package}'")]
    DuplicateVendorDecl { package: String },

    #[error("Vendor dependency '{name}' of '{package}' must be an exact version, got '{version}'")]
    InexactVersion {
        package: String,
        name: String,
        version: String,
    },

    #[error("'{operation}' is no longer supported")]
    UnsupportedApi { operation: String },

    // Resolution errors
    #[error("Package '{name}' not found")]
    PackageNotFound { name: String },

    // Conflict errors
    #[error(
        "Conflict in package '{package}': {claimants:?} are both trying to handle '.{extension}'"
    )]
    ExtensionConflict {
        package: String,
        extension: String,
        claimants: Vec<String>,
    },

    // Internal invariant violations
    #[error("Internal error: source file '{path}' is outside of its package root")]
    SourceOutsideRoot { path: String },

    #[error("Descriptor include '{path}' escapes the package directory")]
    IncludeOutsideRoot { path: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Comet operations
pub type CometResult<T> = Result<T, CometError>;

impl CometError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is a user configuration mistake, as opposed to a
    /// missing package or an internal bug
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CometError::DescriptorParse { .. }
                | CometError::DuplicateRoleHandler { .. }
                | CometError::DuplicateExtension { .. }
                | CometError::DuplicateVendorDecl { .. }
                | CometError::InexactVersion { .. }
                | CometError::UnsupportedApi { .. }
        )
    }
}
