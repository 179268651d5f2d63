//! Descriptor and project file parsing for Comet.
//!
//! This crate handles parsing and validation of `package.toml` descriptors
//! and the application project file, providing the typed descriptor model
//! the loader evaluates.

pub mod descriptor;
pub mod project;

// Re-export main types
pub use descriptor::{
    parse_descriptor, DescriptorToml, ExportEntry, FileEntry, MetadataSection, PackageEntry,
    RoleSection, VendorSection,
};
pub use project::declared_packages;

use comet_core::error::CometError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, CometError>;
