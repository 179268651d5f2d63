//! Package loading and resolution engine for Comet.
//!
//! This crate turns on-disk package directories (and an application
//! directory) into in-memory `Package` records ready for a downstream
//! compiler/bundler:
//! - `evaluate`: descriptor evaluation against the two facades
//! - `registry`: name resolution across search locations, with caching and
//!   eager transitive loading
//! - `scan`: filesystem source discovery
//! - `extensions`: compiler-handler dispatch by file extension
//! - `vendor`: pinned external dependency installation
//! - `app`: pseudo-packages synthesized from an application directory

pub mod app;
pub mod evaluate;
pub mod extensions;
pub mod registry;
pub mod scan;
pub mod vendor;

// Re-export main types
pub use comet_core::error::CometError;

pub use app::from_app_dir;
pub use evaluate::{evaluate_package_dir, PackageFacade, VendorFacade};
pub use extensions::{registered_extensions, source_handler};
pub use registry::{
    format_list, PackageRegistry, RegistrySettings, ReleaseManifest, ResolveOptions,
};
pub use scan::SourceScanner;
pub use vendor::{
    ensure_only_exact_versions, install_vendor_dependencies, DependencyFetcher, VendorInstaller,
};

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, CometError>;
