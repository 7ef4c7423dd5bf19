//! Writes a prepared site to the destination directory.
//!
//! Export always starts from an empty destination:
//!
//! ```text
//! 1. remove <destination>/ entirely (missing is fine)
//! 2. documents, in order: render body → <dir>/<output basename><output extension>
//! 3. assets, in order:    copy bytes  → <dir>/<name>
//! ```
//!
//! The first failure stops the export. Whatever was written up to that point
//! stays on disk.

use crate::render::{EngineRegistry, RenderError};
use crate::types::{BuildContext, Site};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to clean {path}: {source}")]
    Clean {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render {path}: {source}")]
    Render {
        path: PathBuf,
        #[source]
        source: RenderError,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What an export wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub destination: PathBuf,
    /// Documents rendered
    pub documents: usize,
    /// Assets copied
    pub assets: usize,
    /// Total bytes written, rendered and copied
    pub bytes: u64,
    /// Every file written, relative to the destination, in write order
    pub files: Vec<PathBuf>,
}

/// Clean the destination of `ctx`, then render every document and copy every
/// asset of `site` into it.
pub fn export(
    site: &Site,
    ctx: &BuildContext,
    registry: &EngineRegistry,
) -> Result<ExportSummary, ExportError> {
    let destination = ctx.destination();
    clean(destination)?;
    create_dir(destination)?;

    let mut summary = ExportSummary {
        destination: destination.to_path_buf(),
        documents: 0,
        assets: 0,
        bytes: 0,
        files: Vec::with_capacity(site.documents.len() + site.assets.len()),
    };

    for doc in &site.documents {
        let rendered = registry
            .render(&doc.entry.extension, &doc.body)
            .map_err(|source| ExportError::Render {
                path: doc.entry.relative_path(),
                source,
            })?;

        let out = doc.destination_path(destination);
        create_parent(&out)?;
        fs::write(&out, &rendered).map_err(|source| ExportError::Write {
            path: out.clone(),
            source,
        })?;
        debug!(
            source = %doc.entry.relative_path().display(),
            output = %out.display(),
            bytes = rendered.len(),
            "rendered document"
        );

        summary.documents += 1;
        summary.bytes += rendered.len() as u64;
        summary.files.push(doc.destination_path(Path::new("")));
    }

    for asset in &site.assets {
        let from = asset.entry.source_path(ctx.source());
        let out = asset.destination_path(destination);
        create_parent(&out)?;
        let copied = fs::copy(&from, &out).map_err(|source| ExportError::Copy {
            from: from.clone(),
            to: out.clone(),
            source,
        })?;
        debug!(output = %out.display(), bytes = copied, "copied asset");

        summary.assets += 1;
        summary.bytes += copied;
        summary.files.push(asset.destination_path(Path::new("")));
    }

    info!(
        destination = %destination.display(),
        documents = summary.documents,
        assets = summary.assets,
        bytes = summary.bytes,
        "exported site"
    );
    Ok(summary)
}

fn clean(destination: &Path) -> Result<(), ExportError> {
    match fs::remove_dir_all(destination) {
        Ok(()) => {
            debug!(dir = %destination.display(), "cleaned destination");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ExportError::Clean {
            path: destination.to_path_buf(),
            source,
        }),
    }
}

fn create_dir(dir: &Path) -> Result<(), ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

fn create_parent(path: &Path) -> Result<(), ExportError> {
    match path.parent() {
        Some(parent) => create_dir(parent),
        None => Ok(()),
    }
}
