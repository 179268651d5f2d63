//! Core data types for Comet package loading.
//!
//! This module provides the fundamental types used throughout Comet:
//! - Role and Environment enums
//! - Role/environment keyed tables
//! - The Package entity and its typed role-handler records

pub mod package;
pub mod role;
pub mod table;

// Re-export all public types
pub use package::{
    ExportDecl, FileDecl, Package, PackageMetadata, RoleDecl, RoleTableDecls, SourceHandler,
    UseDecl, FOUNDATION,
};
pub use role::{Environment, Role};
pub use table::{EnvTable, RoleTable};
