//! Metadata enrichment: the second half of `prepare`.
//!
//! For every entry the walk produced, the enricher builds the metadata mapping
//! from scratch:
//!
//! ```text
//! _post.yaml      →  baseline
//! post.md  ---    →  frontmatter, wins on key collisions
//!          ---
//! lifting         →  created / title / excerpt / url move into typed fields
//! ```
//!
//! Documents are processed before assets, each list in walk order. Only
//! documents are read from disk; an asset's metadata comes from its companion
//! file alone.
//!
//! The mapping is cleared before anything is merged, so enriching the same
//! site twice gives the same result as enriching it once.

use crate::config::DocumentDefaults;
use crate::data::{self, DataError};
use crate::frontmatter::{FrontmatterError, parse_frontmatter};
use crate::types::{Document, Entry, Metadata, Site};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_yaml_ng::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Companion(#[from] DataError),
    #[error("failed to parse frontmatter in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },
}

/// Non-fatal findings reported by enrichment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A `created` value matched none of [`CREATED_FORMATS`]. The walk's
    /// timestamp was kept and the key left in the metadata.
    TimestampOverride { path: PathBuf, value: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::TimestampOverride { path, value } => write!(
                f,
                "{}: could not parse created timestamp '{value}' with any known format",
                path.display()
            ),
        }
    }
}

/// Formats tried for a `created` value, first match wins.
pub const CREATED_FORMATS: [CreatedFormat; 5] = [
    CreatedFormat::Rfc3339,
    CreatedFormat::DateTime("%Y-%m-%dT%H:%M:%SZ"),
    CreatedFormat::DateTime("%Y-%m-%d %H:%M:%S"),
    CreatedFormat::Date("%Y-%m-%d"),
    CreatedFormat::Date("%m/%d/%Y"),
];

/// One accepted layout for `created`. Values without a zone are UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatedFormat {
    Rfc3339,
    DateTime(&'static str),
    Date(&'static str),
}

impl CreatedFormat {
    fn parse(self, value: &str) -> Option<DateTime<Utc>> {
        match self {
            CreatedFormat::Rfc3339 => DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            CreatedFormat::DateTime(fmt) => NaiveDateTime::parse_from_str(value, fmt)
                .ok()
                .map(|t| t.and_utc()),
            CreatedFormat::Date(fmt) => NaiveDate::parse_from_str(value, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|t| t.and_utc()),
        }
    }
}

/// Parse a `created` value with the first matching format.
pub fn parse_created(value: &str) -> Option<DateTime<Utc>> {
    CREATED_FORMATS.iter().find_map(|fmt| fmt.parse(value))
}

/// Enrich every document and asset in `site` with its metadata.
///
/// `source_root` is where documents and companion files are read from.
/// Returns the non-fatal diagnostics collected along the way; each one has
/// also been logged.
pub fn enrich(
    site: &mut Site,
    source_root: &Path,
    defaults: &DocumentDefaults,
) -> Result<Vec<Diagnostic>, EnrichError> {
    let mut diagnostics = Vec::new();

    for doc in &mut site.documents {
        enrich_document(doc, source_root, defaults, &mut diagnostics)?;
    }
    for asset in &mut site.assets {
        load_companion(&mut asset.entry, source_root)?;
        lift_created(&mut asset.entry, &mut diagnostics);
    }

    info!(
        documents = site.documents.len(),
        assets = site.assets.len(),
        diagnostics = diagnostics.len(),
        "enriched site metadata"
    );
    Ok(diagnostics)
}

fn enrich_document(
    doc: &mut Document,
    source_root: &Path,
    defaults: &DocumentDefaults,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), EnrichError> {
    load_companion(&mut doc.entry, source_root)?;

    let path = doc.entry.source_path(source_root);
    let raw = fs::read(&path).map_err(|source| EnrichError::Read {
        path: path.clone(),
        source,
    })?;
    let fm = parse_frontmatter(&raw).map_err(|source| EnrichError::Parse {
        path: path.clone(),
        source,
    })?;
    if let Some(frontmatter) = fm.data {
        doc.entry.data.extend(frontmatter);
    }
    doc.body = fm.body.to_vec();

    lift_created(&mut doc.entry, diagnostics);
    let data = &mut doc.entry.data;
    doc.title = lift_string(data, "title").unwrap_or_else(|| defaults.title.clone());
    doc.excerpt = lift_string(data, "excerpt").unwrap_or_else(|| defaults.excerpt.clone());
    doc.url = lift_string(data, "url").unwrap_or_else(|| defaults.url.clone());

    debug!(
        path = %doc.entry.relative_path().display(),
        title = %doc.title,
        keys = doc.entry.data.len(),
        "enriched document"
    );
    Ok(())
}

fn load_companion(entry: &mut Entry, source_root: &Path) -> Result<(), EnrichError> {
    entry.data = data::load_companion(&source_root.join(&entry.dir), &entry.basename)?;
    Ok(())
}

/// Move a string value out of the mapping. Other value kinds stay put.
fn lift_string(data: &mut Metadata, key: &str) -> Option<String> {
    if !matches!(data.get(key), Some(Value::String(_))) {
        return None;
    }
    match data.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

fn lift_created(entry: &mut Entry, diagnostics: &mut Vec<Diagnostic>) {
    let Some(Value::String(value)) = entry.data.get("created") else {
        return;
    };

    match parse_created(value) {
        Some(created) => {
            entry.created = created;
            entry.data.remove("created");
        }
        None => {
            let diagnostic = Diagnostic::TimestampOverride {
                path: entry.relative_path(),
                value: value.clone(),
            };
            warn!("{diagnostic}");
            diagnostics.push(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::walk::walk;
    use chrono::TimeZone;

    fn prepared(tree: &SourceTree) -> (Site, Vec<Diagnostic>) {
        let mut site = walk(&tree.context()).unwrap();
        let diagnostics = enrich(&mut site, tree.root(), &DocumentDefaults::default()).unwrap();
        (site, diagnostics)
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    // =========================================================================
    // parse_created
    // =========================================================================

    #[test]
    fn created_rfc3339_with_offset() {
        assert_eq!(
            parse_created("2023-12-01T10:30:00+02:00"),
            Some(utc(2023, 12, 1, 8, 30, 0))
        );
    }

    #[test]
    fn created_utc_z_suffix() {
        assert_eq!(
            parse_created("2023-12-01T10:30:00Z"),
            Some(utc(2023, 12, 1, 10, 30, 0))
        );
    }

    #[test]
    fn created_space_separated() {
        assert_eq!(
            parse_created("2023-12-01 10:30:00"),
            Some(utc(2023, 12, 1, 10, 30, 0))
        );
    }

    #[test]
    fn created_date_only_is_midnight_utc() {
        assert_eq!(parse_created("2023-12-01"), Some(utc(2023, 12, 1, 0, 0, 0)));
    }

    #[test]
    fn created_us_date() {
        assert_eq!(parse_created("12/01/2023"), Some(utc(2023, 12, 1, 0, 0, 0)));
    }

    #[test]
    fn created_garbage_rejected() {
        assert_eq!(parse_created("not-a-date"), None);
        assert_eq!(parse_created("2023-13-45"), None);
        assert_eq!(parse_created(""), None);
    }

    // =========================================================================
    // Merging
    // =========================================================================

    #[test]
    fn frontmatter_wins_over_companion() {
        let tree = SourceTree::new();
        tree.file("_post.yaml", "a: 1\nb: 1\n")
            .file("post.md", "---\nb: 2\nc: 2\n---\nbody");

        let (site, _) = prepared(&tree);
        let data = &find_document(&site, "post.md").entry.data;

        assert_eq!(data.len(), 3);
        assert_eq!(data["a"], yaml("1"));
        assert_eq!(data["b"], yaml("2"));
        assert_eq!(data["c"], yaml("2"));
    }

    #[test]
    fn body_is_stripped_of_frontmatter() {
        let tree = SourceTree::new();
        tree.file("post.md", "---\ntitle: T\n---\n# Heading\n");

        let (site, _) = prepared(&tree);
        assert_eq!(find_document(&site, "post.md").body, b"# Heading\n");
    }

    #[test]
    fn body_without_frontmatter_is_whole_file() {
        let tree = SourceTree::new();
        tree.file("plain.md", "# Plain\n");

        let (site, _) = prepared(&tree);
        let doc = find_document(&site, "plain.md");
        assert_eq!(doc.body, b"# Plain\n");
        assert!(doc.entry.data.is_empty());
    }

    #[test]
    fn readme_uses_source_basename_for_companion() {
        let tree = SourceTree::new();
        tree.file("README.md", "home")
            .file("_README.yaml", "title: Home\n")
            .file("_index.yaml", "title: Wrong\n");

        let (site, _) = prepared(&tree);
        assert_eq!(find_document(&site, "README.md").title, "Home");
    }

    #[test]
    fn asset_gets_companion_data() {
        let tree = SourceTree::new();
        tree.file("img/cover.jpg", [0xff, 0xd8])
            .file("img/_cover.yml", "alt: A cover\n");

        let (site, _) = prepared(&tree);
        let asset = find_asset(&site, "img/cover.jpg");
        assert_eq!(asset.entry.data["alt"], yaml("A cover"));
    }

    // =========================================================================
    // Lifting
    // =========================================================================

    #[test]
    fn well_known_keys_are_lifted() {
        let tree = SourceTree::new();
        tree.file(
            "post.md",
            "---\ntitle: Hello\nexcerpt: Short\nurl: /hello\ntags: [a]\n---\nbody",
        );

        let (site, _) = prepared(&tree);
        let doc = find_document(&site, "post.md");

        assert_eq!(doc.title, "Hello");
        assert_eq!(doc.excerpt, "Short");
        assert_eq!(doc.url, "/hello");
        assert_eq!(doc.entry.data.keys().collect::<Vec<_>>(), vec!["tags"]);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let tree = SourceTree::new();
        tree.file("post.md", "no frontmatter");

        let mut site = walk(&tree.context()).unwrap();
        let defaults = DocumentDefaults {
            title: "Untitled".into(),
            excerpt: String::new(),
            url: "#".into(),
        };
        enrich(&mut site, tree.root(), &defaults).unwrap();
        let doc = find_document(&site, "post.md");

        assert_eq!(doc.title, "Untitled");
        assert_eq!(doc.excerpt, "");
        assert_eq!(doc.url, "#");
    }

    #[test]
    fn non_string_title_stays_in_data() {
        let tree = SourceTree::new();
        tree.file("post.md", "---\ntitle: 2024\n---\n");

        let (site, _) = prepared(&tree);
        let doc = find_document(&site, "post.md");

        assert_eq!(doc.title, "");
        assert_eq!(doc.entry.data["title"], yaml("2024"));
    }

    #[test]
    fn asset_title_is_not_lifted() {
        let tree = SourceTree::new();
        tree.file("a.png", [0u8]).file("_a.yaml", "title: Picture\n");

        let (site, _) = prepared(&tree);
        assert_eq!(find_asset(&site, "a.png").entry.data["title"], yaml("Picture"));
    }

    #[test]
    fn created_date_is_lifted() {
        let tree = SourceTree::new();
        tree.file("post.md", "---\ncreated: 2023-12-01\n---\n");

        let (site, diagnostics) = prepared(&tree);
        let doc = find_document(&site, "post.md");

        assert_eq!(doc.entry.created, utc(2023, 12, 1, 0, 0, 0));
        assert!(!doc.entry.data.contains_key("created"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unparseable_created_warns_and_keeps_key() {
        let tree = SourceTree::new();
        tree.file("post.md", "---\ncreated: not-a-date\n---\n");

        let walked = walk(&tree.context()).unwrap();
        let original = find_document(&walked, "post.md").entry.created;
        let (site, diagnostics) = prepared(&tree);
        let doc = find_document(&site, "post.md");

        assert_eq!(doc.entry.created, original);
        assert_eq!(doc.entry.data["created"], yaml("not-a-date"));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::TimestampOverride {
                path: PathBuf::from("post.md"),
                value: "not-a-date".to_string(),
            }]
        );
    }

    #[test]
    fn asset_created_from_companion() {
        let tree = SourceTree::new();
        tree.file("photo.jpg", [0u8])
            .file("_photo.yaml", "created: 2020-01-02 03:04:05\n");

        let (site, _) = prepared(&tree);
        let asset = find_asset(&site, "photo.jpg");

        assert_eq!(asset.entry.created, utc(2020, 1, 2, 3, 4, 5));
        assert!(asset.entry.data.is_empty());
    }

    // =========================================================================
    // Errors and idempotency
    // =========================================================================

    #[test]
    fn malformed_frontmatter_names_document() {
        let tree = SourceTree::new();
        tree.file("blog/bad.md", "---\ntitle: [oops\n---\nbody");

        let mut site = walk(&tree.context()).unwrap();
        let err = enrich(&mut site, tree.root(), &DocumentDefaults::default()).unwrap_err();

        match &err {
            EnrichError::Parse { path, .. } => assert!(path.ends_with("blog/bad.md")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_companion_is_error() {
        let tree = SourceTree::new();
        tree.file("a.css", "").file("_a.yaml", "- not\n- a mapping\n");

        let mut site = walk(&tree.context()).unwrap();
        let result = enrich(&mut site, tree.root(), &DocumentDefaults::default());

        assert!(matches!(
            result,
            Err(EnrichError::Companion(DataError::Parse { .. }))
        ));
    }

    #[test]
    fn enriching_twice_is_idempotent() {
        let tree = SourceTree::new();
        tree.file("_post.yaml", "a: 1\n")
            .file("post.md", "---\ntitle: T\ncreated: 2023-12-01\nb: 2\n---\nbody");

        let mut site = walk(&tree.context()).unwrap();
        let defaults = DocumentDefaults::default();
        enrich(&mut site, tree.root(), &defaults).unwrap();
        let first = site.documents.clone();
        enrich(&mut site, tree.root(), &defaults).unwrap();

        assert_eq!(site.documents, first);
    }

    #[test]
    fn diagnostic_message_names_path_and_value() {
        let diagnostic = Diagnostic::TimestampOverride {
            path: PathBuf::from("blog/post.md"),
            value: "yesterday".into(),
        };
        let msg = diagnostic.to_string();
        assert!(msg.contains("blog/post.md"));
        assert!(msg.contains("'yesterday'"));
    }
}
