//! Source tree traversal and classification.
//!
//! First half of `prepare`. Walks the source directory in file-name order and
//! turns every file into either a [`Document`] (rendered on export) or an
//! [`Asset`] (copied verbatim). Nothing is read beyond filesystem metadata;
//! file contents are the enricher's job.
//!
//! ## Exclusion
//!
//! Anything whose name starts with `_` or `.` is skipped. For directories the
//! whole subtree is pruned, which is how `_data/`, `_site/`, `.git/` and
//! companion files like `_post.yaml` stay out of the output:
//!
//! ```text
//! site/
//! ├── _config.toml        skipped
//! ├── _data/              skipped, with everything below it
//! ├── .git/               skipped, with everything below it
//! ├── README.md           Document → index.html
//! ├── _README.yaml        skipped (companion data for README.md)
//! └── blog/
//!     ├── first-post.md   Document → blog/first-post.html
//!     └── cover.jpg       Asset    → blog/cover.jpg
//! ```
//!
//! The source root itself is never excluded, and the build destination is
//! pruned when it lives inside the source tree under a name the prefix rule
//! would not catch.
//!
//! Symlinks are not traversed. A link to a file is described by its target;
//! a link to a directory is skipped.

use crate::types::{Asset, BuildContext, Document, Entry, Site, resolve_path};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("source directory not found: {0}")]
    NotFound(PathBuf),
    #[error("cannot traverse {path}: {source}")]
    Traversal {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("cannot read metadata for {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source extension of files that become documents.
pub const MARKDOWN_EXTENSION: &str = ".md";
/// Destination extension of rendered markdown.
pub const HTML_EXTENSION: &str = ".html";

const EXCLUDED_PREFIXES: &[char] = &['_', '.'];

/// Walk the source root of `ctx` and classify every included file.
///
/// Documents and assets keep the order the walk found them in. The returned
/// site has empty metadata; run enrichment before exporting it.
pub fn walk(ctx: &BuildContext) -> Result<Site, WalkError> {
    let root = ctx.source();
    if !root.is_dir() {
        return Err(WalkError::NotFound(root.to_path_buf()));
    }

    // Resolved on both sides: `.` and an absolute destination below it must match.
    let skip = resolve_path(ctx.destination())
        .strip_prefix(resolve_path(root))
        .ok()
        .map(Path::to_path_buf);
    let mut site = Site::new(ctx.version().display());

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded(e, root, skip.as_deref()));

    for dir_entry in walker {
        let dir_entry = dir_entry.map_err(|e| WalkError::Traversal {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e,
        })?;

        if dir_entry.file_type().is_dir() {
            continue;
        }

        let Some(entry) = read_entry(&dir_entry, root)? else {
            debug!(path = %dir_entry.path().display(), "skipping link to a non-file");
            continue;
        };
        match classify(entry) {
            Classified::Document(doc) => {
                debug!(path = %doc.entry.relative_path().display(), "document");
                site.documents.push(doc);
            }
            Classified::Asset(asset) => {
                debug!(path = %asset.entry.relative_path().display(), "asset");
                site.assets.push(asset);
            }
        }
    }

    info!(
        source = %root.display(),
        documents = site.documents.len(),
        assets = site.assets.len(),
        "walked source directory"
    );

    Ok(site)
}

/// Whether a name carries an exclusion prefix.
pub fn is_excluded_name(name: &str) -> bool {
    name.starts_with(EXCLUDED_PREFIXES)
}

fn is_excluded(entry: &DirEntry, root: &Path, skip: Option<&Path>) -> bool {
    if is_excluded_name(&entry.file_name().to_string_lossy()) {
        return true;
    }
    match skip {
        Some(skip) if !skip.as_os_str().is_empty() => {
            entry.path().strip_prefix(root).ok() == Some(skip)
        }
        _ => false,
    }
}

/// `None` when the entry is a symlink to something other than a file.
fn read_entry(dir_entry: &DirEntry, root: &Path) -> Result<Option<Entry>, WalkError> {
    let path = dir_entry.path();
    // Follows symlinks so a linked file is described by its target.
    let meta = fs::metadata(path).map_err(|source| WalkError::Metadata {
        path: path.to_path_buf(),
        source,
    })?;
    if !meta.is_file() {
        return Ok(None);
    }
    let modified: DateTime<Utc> = meta
        .modified()
        .map_err(|source| WalkError::Metadata {
            path: path.to_path_buf(),
            source,
        })?
        .into();

    let dir = path
        .parent()
        .and_then(|p| p.strip_prefix(root).ok())
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let name = dir_entry.file_name().to_string_lossy().into_owned();

    Ok(Some(Entry::new(
        dir,
        name,
        created_time(&meta, modified),
        modified,
    )))
}

/// Best-effort creation time.
///
/// Starts from the modify time and prefers the inode change time when it is
/// earlier. Platforms without one get the modify time.
fn created_time(meta: &fs::Metadata, modified: DateTime<Utc>) -> DateTime<Utc> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let nanos = meta.ctime_nsec() as u32;
        if let Some(changed) = DateTime::<Utc>::from_timestamp(meta.ctime(), nanos)
            && changed < modified
        {
            return changed;
        }
    }
    #[cfg(not(unix))]
    let _ = meta;

    modified
}

enum Classified {
    Document(Document),
    Asset(Asset),
}

fn classify(entry: Entry) -> Classified {
    if entry.extension != MARKDOWN_EXTENSION {
        return Classified::Asset(Asset { entry });
    }

    let output_basename = if entry.basename == "README" {
        "index".to_string()
    } else {
        entry.basename.clone()
    };

    Classified::Document(Document {
        entry,
        title: String::new(),
        excerpt: String::new(),
        url: String::new(),
        output_basename,
        output_extension: HTML_EXTENSION.to_string(),
        body: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn markdown_becomes_document_everything_else_asset() {
        let tree = SourceTree::new();
        tree.file("post.md", "# Post")
            .file("style.css", "body {}")
            .file("logo.png", [0x89, 0x50, 0x4e, 0x47]);

        let site = walk(&tree.context()).unwrap();

        assert_eq!(document_paths(&site), vec!["post.md"]);
        assert_eq!(asset_paths(&site), vec!["logo.png", "style.css"]);
    }

    #[test]
    fn documents_rendered_as_html() {
        let tree = SourceTree::new();
        tree.file("guide.md", "text");

        let site = walk(&tree.context()).unwrap();
        let doc = find_document(&site, "guide.md");

        assert_eq!(doc.entry.basename, "guide");
        assert_eq!(doc.entry.extension, ".md");
        assert_eq!(doc.output_basename, "guide");
        assert_eq!(doc.output_extension, ".html");
    }

    #[test]
    fn readme_destination_is_index() {
        let tree = SourceTree::new();
        tree.file("README.md", "root").file("docs/README.md", "docs");

        let site = walk(&tree.context()).unwrap();

        for doc in &site.documents {
            assert_eq!(doc.entry.name, "README.md");
            assert_eq!(doc.entry.basename, "README");
            assert_eq!(doc.output_basename, "index");
        }
        assert_eq!(site.documents.len(), 2);
    }

    #[test]
    fn readme_match_is_exact() {
        let tree = SourceTree::new();
        tree.file("readme.md", "lower").file("README.txt", "plain");

        let site = walk(&tree.context()).unwrap();

        assert_eq!(find_document(&site, "readme.md").output_basename, "readme");
        assert_eq!(asset_paths(&site), vec!["README.txt"]);
    }

    #[test]
    fn excluded_files_never_appear() {
        let tree = SourceTree::new();
        tree.file("_draft.md", "draft")
            .file(".hidden", "x")
            .file("_post.yaml", "title: T")
            .file("post.md", "post");

        let site = walk(&tree.context()).unwrap();

        assert_eq!(document_paths(&site), vec!["post.md"]);
        assert!(asset_paths(&site).is_empty());
    }

    #[test]
    fn excluded_directories_prune_whole_subtree() {
        let tree = SourceTree::new();
        tree.file("_data/authors.yaml", "a: 1")
            .file("_layouts/deep/nested/page.md", "x")
            .file(".git/objects/ab/cdef", "blob")
            .file("blog/_drafts/wip.md", "wip")
            .file("blog/post.md", "post");

        let site = walk(&tree.context()).unwrap();

        assert_eq!(document_paths(&site), vec!["blog/post.md"]);
        assert!(asset_paths(&site).is_empty());
    }

    #[test]
    fn directories_are_not_recorded() {
        let tree = SourceTree::new();
        tree.dir("empty/inner");

        let site = walk(&tree.context()).unwrap();

        assert!(site.documents.is_empty());
        assert!(site.assets.is_empty());
    }

    #[test]
    fn relative_dir_is_recorded() {
        let tree = SourceTree::new();
        tree.file("a/b/c.txt", "c").file("top.txt", "t");

        let site = walk(&tree.context()).unwrap();

        let nested = find_asset(&site, "a/b/c.txt");
        assert_eq!(nested.entry.dir, Path::new("a/b"));
        let top = find_asset(&site, "top.txt");
        assert_eq!(top.entry.dir, Path::new(""));
    }

    #[test]
    fn walk_order_is_lexical() {
        let tree = SourceTree::new();
        tree.file("c.md", "")
            .file("a.md", "")
            .file("b/z.md", "")
            .file("b/a.md", "");

        let site = walk(&tree.context()).unwrap();

        assert_eq!(
            document_paths(&site),
            vec!["a.md", "b/a.md", "b/z.md", "c.md"]
        );
    }

    #[test]
    fn destination_inside_source_is_skipped() {
        let tree = SourceTree::new();
        tree.file("index.md", "home").file("public/index.html", "old output");

        let ctx = BuildContext::new(tree.root(), "public");
        let site = walk(&ctx).unwrap();

        assert_eq!(document_paths(&site), vec!["index.md"]);
        assert!(asset_paths(&site).is_empty());
    }

    #[test]
    fn destination_skip_compares_resolved_paths() {
        let tree = SourceTree::new();
        tree.dir("sub")
            .file("index.md", "home")
            .file("public/index.html", "old output");

        // Spelled differently from the destination, as a relative `.` source
        // next to an absolute `--output` would be.
        let source = tree.root().join("sub").join("..");
        let ctx = BuildContext::new(&source, tree.root().join("public"));
        let site = walk(&ctx).unwrap();

        assert_eq!(document_paths(&site), vec!["index.md"]);
        assert!(asset_paths(&site).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn directory_symlink_is_skipped() {
        use std::os::unix::fs::symlink;

        let tree = SourceTree::new();
        tree.file("real/a.txt", "a");
        symlink(tree.root().join("real"), tree.root().join("linked")).unwrap();
        symlink(tree.root().join("real/a.txt"), tree.root().join("b.txt")).unwrap();

        let site = walk(&tree.context()).unwrap();

        assert_eq!(asset_paths(&site), vec!["b.txt", "real/a.txt"]);
    }

    #[test]
    fn created_never_after_modified() {
        let tree = SourceTree::new();
        tree.file("a.txt", "a");

        let site = walk(&tree.context()).unwrap();
        let asset = find_asset(&site, "a.txt");

        assert!(asset.entry.created <= asset.entry.modified);
    }

    #[test]
    fn missing_source_is_error() {
        let tree = SourceTree::new();
        let ctx = BuildContext::new(tree.root().join("nope"), "_site");

        let result = walk(&ctx);
        assert!(matches!(result, Err(WalkError::NotFound(_))));
    }

    #[test]
    fn metadata_starts_empty() {
        let tree = SourceTree::new();
        tree.file("post.md", "---\ntitle: T\n---\nbody");

        let site = walk(&tree.context()).unwrap();
        let doc = find_document(&site, "post.md");

        assert!(doc.entry.data.is_empty());
        assert!(doc.body.is_empty());
    }

    #[test]
    fn exclusion_prefixes() {
        assert!(is_excluded_name("_config.toml"));
        assert!(is_excluded_name(".DS_Store"));
        assert!(!is_excluded_name("post_1.md"));
        assert!(!is_excluded_name("a.md"));
    }
}
