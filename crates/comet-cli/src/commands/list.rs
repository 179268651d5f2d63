//! `comet list` command implementation.
//!
//! Prints the human-readable package table: all discoverable packages across
//! the search locations, one line per non-internal package.

use std::sync::Arc;

use anyhow::Context;
use camino::Utf8PathBuf;
use comet_loader::{format_list, PackageRegistry, RegistrySettings, ReleaseManifest};

use super::CommandContext;

/// Execute the `comet list` command
pub fn execute(manifest_path: Option<Utf8PathBuf>, _ctx: &CommandContext) -> anyhow::Result<()> {
    let manifest = manifest_path.map(read_manifest).transpose()?;

    let registry = PackageRegistry::new(RegistrySettings::from_env());
    let listed = registry.list(manifest.as_ref())?;

    print!("{}", format_list(listed.values().map(Arc::as_ref)));
    Ok(())
}

fn read_manifest(path: Utf8PathBuf) -> anyhow::Result<ReleaseManifest> {
    let content =
        std::fs::read(&path).with_context(|| format!("Failed to read manifest {}", path))?;
    serde_json::from_slice(&content).with_context(|| format!("Invalid manifest {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("release.json")).unwrap();
        std::fs::write(&path, r#"{"packages": {"spark": "1.0.2"}}"#).unwrap();

        let manifest = read_manifest(path.clone()).unwrap();
        assert_eq!(
            manifest.packages.get("spark").map(String::as_str),
            Some("1.0.2")
        );

        std::fs::write(&path, "not json").unwrap();
        assert!(read_manifest(path).is_err());
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        assert!(read_manifest(Utf8PathBuf::from("/nonexistent/release.json")).is_err());
    }
}
