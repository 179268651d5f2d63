//! # comet-core
//!
//! Core types and utilities shared across all Comet crates.
//!
//! This crate provides:
//! - The `Package` entity produced by descriptor evaluation
//! - Role and Environment enums with the role/environment table types
//! - CometError enum for unified error handling
//! - Path utilities for root-relative source paths
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Package, Role, Environment, tables)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{CometError, CometResult};
pub use types::{
    EnvTable, Environment, ExportDecl, FileDecl, Package, PackageMetadata, Role, RoleDecl,
    RoleTable, RoleTableDecls, SourceHandler, UseDecl, FOUNDATION,
};
