//! Structured data files: companion data and the site data directory.
//!
//! ## Companion data
//!
//! Any file in the source tree can carry metadata in a sibling YAML file named
//! after its basename with a leading underscore:
//!
//! ```text
//! blog/
//! ├── first-post.md
//! ├── _first-post.yaml     ← metadata for first-post.md
//! ├── cover.jpg
//! └── _cover.yml           ← metadata for cover.jpg (.yml is the fallback)
//! ```
//!
//! The underscore keeps the data file itself out of the walk. A missing file is
//! not an error, it just contributes nothing.
//!
//! ## Site data
//!
//! YAML files directly inside `_data/` at the source root are loaded into
//! `Site::data`, keyed by file stem: `_data/authors.yaml` becomes `authors`.
//! Unlike companion files these may hold any YAML value, not just mappings.

use crate::types::Metadata;
use serde_yaml_ng::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Recognized data file extensions, in lookup order.
pub const DATA_EXTENSIONS: [&str; 2] = [".yaml", ".yml"];

/// Directory under the source root holding site-wide data files.
pub const SITE_DATA_DIR: &str = "_data";

#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: YamlError,
    },
}

/// Problems turning YAML text into [`Metadata`].
#[derive(Error, Debug)]
pub enum YamlError {
    #[error(transparent)]
    Syntax(#[from] serde_yaml_ng::Error),
    #[error("expected a mapping at the top level, found a {0}")]
    NotAMapping(&'static str),
    #[error("mapping keys must be scalars, found a {0}")]
    InvalidKey(&'static str),
}

/// Path of the companion data file for `basename` in `dir`, if one exists.
///
/// `_<basename>.yaml` wins over `_<basename>.yml`.
pub fn companion_path(dir: &Path, basename: &str) -> Option<PathBuf> {
    DATA_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("_{basename}{ext}")))
        .find(|p| p.is_file())
}

/// Load companion data for `basename` in `dir`.
///
/// Returns an empty mapping when neither data file exists.
pub fn load_companion(dir: &Path, basename: &str) -> Result<Metadata, DataError> {
    let Some(path) = companion_path(dir, basename) else {
        return Ok(Metadata::new());
    };

    let text = read_text(&path)?;
    let data = parse_mapping(&text).map_err(|source| DataError::Parse {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), keys = data.len(), "loaded companion data");
    Ok(data)
}

/// Load every data file directly inside `<source_root>/_data/`.
///
/// Files are read in name order. A missing directory yields an empty mapping.
/// When both `x.yaml` and `x.yml` exist the `.yaml` file wins.
pub fn load_site_data(source_root: &Path) -> Result<Metadata, DataError> {
    let dir = source_root.join(SITE_DATA_DIR);
    let mut data = Metadata::new();
    if !dir.is_dir() {
        return Ok(data);
    }

    let io_err = |source| DataError::Io {
        path: dir.clone(),
        source,
    };
    let mut files: Vec<PathBuf> = fs::read_dir(&dir)
        .map_err(io_err)?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(io_err)?;
    files.retain(|p| p.is_file() && data_extension(p).is_some());
    // `.yaml` sorts before `.yml`, so it is seen first for equal stems.
    files.sort();

    for path in files {
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        if data.contains_key(&stem) {
            continue;
        }
        let text = read_text(&path)?;
        let value = parse_value(&text).map_err(|source| DataError::Parse {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), key = %stem, "loaded site data");
        data.insert(stem, value);
    }

    Ok(data)
}

/// Parse YAML text whose top level must be a mapping.
///
/// Empty or comment-only text is an empty mapping. Scalar keys (numbers,
/// booleans) are converted to strings.
pub fn parse_mapping(text: &str) -> Result<Metadata, YamlError> {
    match parse_value(text)? {
        Value::Null => Ok(Metadata::new()),
        Value::Mapping(mapping) => {
            let mut data = Metadata::new();
            for (key, value) in mapping {
                data.insert(key_to_string(key)?, value);
            }
            Ok(data)
        }
        other => Err(YamlError::NotAMapping(kind(&other))),
    }
}

fn parse_value(text: &str) -> Result<Value, YamlError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_yaml_ng::from_str(text)?)
}

fn key_to_string(key: Value) -> Result<String, YamlError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(YamlError::InvalidKey(kind(&other))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn data_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy();
    DATA_EXTENSIONS
        .iter()
        .copied()
        .find(|known| known[1..].eq_ignore_ascii_case(&ext))
}

fn read_text(path: &Path) -> Result<String, DataError> {
    fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}
