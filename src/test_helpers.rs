//! Shared test utilities for the spindle test suite.
//!
//! Provides a throwaway source tree builder plus lookup helpers and bulk
//! extractors that work with walk-phase data structures (`Site`, `Document`,
//! `Asset`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tree = SourceTree::new();
//! tree.file("README.md", "# Home")
//!     .file("img/logo.png", [0x89, b'P', b'N', b'G']);
//!
//! let site = walk(&tree.context()).unwrap();
//!
//! assert_eq!(document_paths(&site), vec!["README.md"]);
//! let logo = find_asset(&site, "img/logo.png");
//! assert_eq!(logo.entry.extension, ".png");
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::types::{Asset, BuildContext, Document, Site};

// =========================================================================
// Source tree setup
// =========================================================================

/// A source directory in a temp dir, removed on drop.
pub struct SourceTree {
    tmp: TempDir,
}

impl SourceTree {
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Write a file at `rel`, creating parent directories.
    pub fn file(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        self
    }

    /// Create an empty directory at `rel`.
    pub fn dir(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.root().join(rel)).unwrap();
        self
    }

    /// Build context with the stock `_site` destination.
    pub fn context(&self) -> BuildContext {
        BuildContext::new(self.root(), "_site")
    }
}

// =========================================================================
// Site lookups — panics with a clear message on miss
// =========================================================================

/// Find a document by its path relative to the source root. Panics if not found.
pub fn find_document<'a>(site: &'a Site, rel: &str) -> &'a Document {
    site.documents
        .iter()
        .find(|d| d.entry.relative_path() == Path::new(rel))
        .unwrap_or_else(|| {
            let paths = document_paths(site);
            panic!("document '{rel}' not found. Available: {paths:?}")
        })
}

/// Find an asset by its path relative to the source root. Panics if not found.
pub fn find_asset<'a>(site: &'a Site, rel: &str) -> &'a Asset {
    site.assets
        .iter()
        .find(|a| a.entry.relative_path() == Path::new(rel))
        .unwrap_or_else(|| {
            let paths = asset_paths(site);
            panic!("asset '{rel}' not found. Available: {paths:?}")
        })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// Relative source paths of all documents, in walk order.
pub fn document_paths(site: &Site) -> Vec<String> {
    site.documents
        .iter()
        .map(|d| d.entry.relative_path().to_string_lossy().into_owned())
        .collect()
}

/// Relative source paths of all assets, in walk order.
pub fn asset_paths(site: &Site) -> Vec<String> {
    site.assets
        .iter()
        .map(|a| a.entry.relative_path().to_string_lossy().into_owned())
        .collect()
}

/// Parse a YAML snippet into a value for comparisons.
pub fn yaml(text: &str) -> serde_yaml_ng::Value {
    serde_yaml_ng::from_str(text).unwrap()
}
