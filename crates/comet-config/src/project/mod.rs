//! Application project file.
//!
//! An app declares extra packages (beyond the fixed baseline) in
//! `.comet/packages`, one name per line. `#` starts a comment.

use camino::Utf8Path;
use comet_core::error::CometError;

use crate::ConfigResult;

/// Relative path of the project packages file inside an app directory
pub const PROJECT_PACKAGES_FILE: &str = ".comet/packages";

/// Packages the project declares on top of the baseline set. A missing file
/// means no extras.
pub fn declared_packages(app_dir: &Utf8Path) -> ConfigResult<Vec<String>> {
    let path = app_dir.join(PROJECT_PACKAGES_FILE);
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| CometError::io(format!("Failed to read {}", path), e))?;

    let mut packages = Vec::new();
    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if !line.is_empty() {
            packages.push(line.to_string());
        }
    }
    Ok(packages)
}
