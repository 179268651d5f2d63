//! Filesystem source discovery.
//!
//! Walks a package's source tree depth-first, alphabetically by path
//! segment, keeps files whose extension is on the allow-list, drops ignored
//! paths, and reorders markup files to the front of the list. Markup
//! (template) files must be available before arbitrary script files that may
//! reference them.

use std::collections::BTreeSet;

use camino::{Utf8Path, Utf8PathBuf};
use comet_core::error::CometError;
use comet_core::utils::relative_to_root;
use regex::Regex;
use walkdir::WalkDir;

use crate::LoaderResult;

/// Extensions (with leading dot) whose files are hoisted to the front
pub const MARKUP_EXTENSIONS: [&str; 1] = [".html"];

/// Scanner for one package root
#[derive(Debug)]
pub struct SourceScanner {
    root: Utf8PathBuf,
    /// Recognized extensions, with leading dots
    extensions: BTreeSet<String>,
    /// Patterns matched against absolute paths
    ignore: Vec<Regex>,
    /// Extensions hoisted to the front, with leading dots
    markup_extensions: BTreeSet<String>,
}

impl SourceScanner {
    pub fn new(
        root: impl Into<Utf8PathBuf>,
        extensions: impl IntoIterator<Item = String>,
        ignore: Vec<Regex>,
    ) -> Self {
        Self {
            root: root.into(),
            extensions: extensions.into_iter().collect(),
            ignore,
            markup_extensions: MARKUP_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Override the markup extension set
    pub fn markup_extensions(mut self, extensions: impl IntoIterator<Item = String>) -> Self {
        self.markup_extensions = extensions.into_iter().collect();
        self
    }

    /// Produce the ordered, deduplicated source list, relative to the root.
    ///
    /// Markup files keep their relative order but move ahead of everything
    /// else.
    pub fn scan(&self) -> LoaderResult<Vec<Utf8PathBuf>> {
        let mut files = Vec::new();
        let mut seen = BTreeSet::new();

        let walker = WalkDir::new(&self.root).sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| {
                CometError::io(
                    format!("Failed to walk {}", self.root),
                    std::io::Error::other(e.to_string()),
                )
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let abs = Utf8PathBuf::from_path_buf(entry.into_path()).map_err(|path| {
                CometError::io(
                    format!("Non UTF-8 path under {}", self.root),
                    std::io::Error::other(path.display().to_string()),
                )
            })?;

            if self.ignore.iter().any(|pattern| pattern.is_match(abs.as_str())) {
                continue;
            }
            if !self.recognizes(&abs) {
                continue;
            }

            // A file resolving outside the root is a bug, never dropped
            let rel = relative_to_root(&self.root, &abs)?;
            if seen.insert(rel.clone()) {
                files.push(rel);
            }
        }

        Ok(self.markup_first(files))
    }

    fn recognizes(&self, path: &Utf8Path) -> bool {
        match dotted_extension(path) {
            Some(ext) => self.extensions.contains(&ext),
            None => false,
        }
    }

    fn markup_first(&self, files: Vec<Utf8PathBuf>) -> Vec<Utf8PathBuf> {
        let (mut markup, rest): (Vec<_>, Vec<_>) = files.into_iter().partition(|path| {
            dotted_extension(path)
                .map(|ext| self.markup_extensions.contains(&ext))
                .unwrap_or(false)
        });
        markup.extend(rest);
        markup
    }
}

/// File extension including the leading dot
fn dotted_extension(path: &Utf8Path) -> Option<String> {
    path.extension().map(|ext| format!(".{}", ext))
}
