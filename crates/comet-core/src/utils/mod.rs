//! Utility functions and helpers.

pub mod path;

pub use path::{has_segment, is_package_dir, relative_to_root, DESCRIPTOR_FILE};
