//! Shared types used across all pipeline stages.
//!
//! The walk creates [`Document`]s and [`Asset`]s, enrichment fills in their
//! metadata, and export reads them back. Everything here is plain data: the
//! only behavior is path arithmetic. All types serialize to JSON so a prepared
//! [`Site`] can be inspected before anything is written (`build --dry-run`).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Generic metadata merged from companion data files and frontmatter.
///
/// Sorted so serialized output is stable between runs.
pub type Metadata = BTreeMap<String, serde_yaml_ng::Value>;

/// Fields shared by every file discovered in the source tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// File name, e.g. `styles.css`
    pub name: String,
    /// File name without its final extension, e.g. `styles`
    pub basename: String,
    /// Final extension including the dot, e.g. `.css`. Empty if none.
    pub extension: String,
    /// Directory containing the file, relative to the source root
    pub dir: PathBuf,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// Companion data and frontmatter that were not lifted into typed fields
    pub data: Metadata,
}

impl Entry {
    /// Build an entry for `dir/name` with empty metadata.
    pub fn new(
        dir: impl Into<PathBuf>,
        name: impl Into<String>,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        let (basename, extension) = split_file_name(&name);
        Self {
            name,
            basename,
            extension,
            dir: dir.into(),
            created,
            modified,
            data: Metadata::new(),
        }
    }

    /// Absolute path of the file inside `source_root`.
    pub fn source_path(&self, source_root: &Path) -> PathBuf {
        source_root.join(&self.dir).join(&self.name)
    }

    /// Path relative to the source root, for display and error messages.
    pub fn relative_path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }
}

/// Split a file name into basename and extension (with leading dot).
///
/// - `styles.css` → (`styles`, `.css`)
/// - `archive.tar.gz` → (`archive.tar`, `.gz`)
/// - `Makefile` → (`Makefile`, ``)
pub fn split_file_name(name: &str) -> (String, String) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (name[..pos].to_string(), name[pos..].to_string()),
        _ => (name.to_string(), String::new()),
    }
}

/// A file copied to the destination unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    #[serde(flatten)]
    pub entry: Entry,
}

impl Asset {
    /// Assets keep their original name in the destination tree.
    pub fn destination_path(&self, destination_root: &Path) -> PathBuf {
        destination_root.join(&self.entry.dir).join(&self.entry.name)
    }
}

/// A file transformed by a render engine before export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(flatten)]
    pub entry: Entry,
    pub title: String,
    pub excerpt: String,
    pub url: String,
    /// Destination basename. Same as the source basename except `README` → `index`.
    pub output_basename: String,
    /// Destination extension, e.g. `.html` for markdown sources
    pub output_extension: String,
    /// Source bytes with any frontmatter block removed. Filled in by enrichment.
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl Document {
    /// Destination path: relative dir + output basename + output extension.
    pub fn destination_path(&self, destination_root: &Path) -> PathBuf {
        destination_root
            .join(&self.entry.dir)
            .join(format!("{}{}", self.output_basename, self.output_extension))
    }
}

/// Everything discovered and enriched by `prepare`.
#[derive(Debug, Clone, Serialize)]
pub struct Site {
    /// When the site metadata was collected
    pub time: DateTime<Utc>,
    /// Version of the generator that built the site
    pub version: String,
    /// Transformed files, in walk order
    pub documents: Vec<Document>,
    /// Verbatim files, in walk order
    pub assets: Vec<Asset>,
    /// Site-wide data from `_data/`, keyed by file stem
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub data: Metadata,
}

impl Site {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            version: version.into(),
            documents: Vec::new(),
            assets: Vec::new(),
            data: Metadata::new(),
        }
    }
}

/// Version of this generator, captured at compile time by `build.rs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub on_release_tag: bool,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            git_hash: env!("GIT_HASH"),
            on_release_tag: env!("ON_RELEASE_TAG") == "true",
        }
    }

    /// `1.2.3` on a release tag, `dev@<hash>` otherwise.
    pub fn display(&self) -> String {
        if self.on_release_tag {
            self.version.to_string()
        } else if self.git_hash.is_empty() {
            "dev@unknown".to_string()
        } else {
            format!("dev@{}", self.git_hash)
        }
    }
}

/// Paths and version for one build. Never changes after construction.
#[derive(Debug, Clone)]
pub struct BuildContext {
    source: PathBuf,
    destination: PathBuf,
    version: VersionInfo,
}

impl BuildContext {
    /// `destination` is resolved against `source` when relative.
    pub fn new(source: impl Into<PathBuf>, destination: impl AsRef<Path>) -> Self {
        let source = source.into();
        let destination = source.join(destination);
        Self {
            source,
            destination,
            version: VersionInfo::current(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn version(&self) -> &VersionInfo {
        &self.version
    }
}

/// Absolute, canonical where the path exists, lexically cleaned otherwise.
pub fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
