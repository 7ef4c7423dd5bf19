//! The build pipeline: one value holding all state for a site build.
//!
//! ```text
//!                prepare()              build()
//! Uninitialized ──────────→ Prepared ──────────→ Built
//!       ↑                      │  ↑                │
//!       └── prepare() fails ───┘  └── prepare() ───┘
//! ```
//!
//! `prepare` walks the source tree, enriches every entry, and loads site data.
//! `build` exports the prepared site. It can be called again to re-clean and
//! re-render from the same in-memory site; it never re-reads metadata.

use crate::config::SiteConfig;
use crate::data::{self, DataError};
use crate::enrich::{self, Diagnostic, EnrichError};
use crate::export::{self, ExportError, ExportSummary};
use crate::render::{EngineRegistry, MarkdownEngine};
use crate::types::{BuildContext, Site, resolve_path};
use crate::walk::{self, WalkError};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to walk source directory: {0}")]
    Walk(#[from] WalkError),
    #[error("failed to extract data: {0}")]
    Enrich(#[from] EnrichError),
    #[error("failed to load site data: {0}")]
    SiteData(#[from] DataError),
    #[error("site metadata not prepared")]
    NotPrepared,
    #[error("failed to export site: {0}")]
    Export(#[from] ExportError),
    #[error("destination {destination} would delete the source directory {source_dir}")]
    UnsafeDestination {
        destination: PathBuf,
        source_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Uninitialized,
    Prepared,
    Built,
}

pub struct Pipeline {
    ctx: BuildContext,
    config: SiteConfig,
    registry: EngineRegistry,
    state: State,
    site: Option<Site>,
    diagnostics: Vec<Diagnostic>,
}

impl Pipeline {
    /// Create a pipeline for `source` with the default engines.
    ///
    /// The destination comes from `config`. It is refused when cleaning it
    /// would delete the source tree.
    pub fn new(source: impl Into<PathBuf>, config: SiteConfig) -> Result<Self, PipelineError> {
        let registry = EngineRegistry::with_markdown(MarkdownEngine::new(
            config.markdown.heading_ids,
        ));
        Self::with_registry(source, config, registry)
    }

    /// Create a pipeline that renders with `registry`.
    pub fn with_registry(
        source: impl Into<PathBuf>,
        config: SiteConfig,
        registry: EngineRegistry,
    ) -> Result<Self, PipelineError> {
        let ctx = BuildContext::new(source, &config.destination);
        check_destination(&ctx)?;

        Ok(Self {
            ctx,
            config,
            registry,
            state: State::Uninitialized,
            site: None,
            diagnostics: Vec::new(),
        })
    }

    /// Walk and enrich the source tree.
    ///
    /// On failure the previous site, if any, is discarded and the pipeline
    /// returns to `Uninitialized`.
    pub fn prepare(&mut self) -> Result<&Site, PipelineError> {
        self.site = None;
        self.diagnostics.clear();
        self.state = State::Uninitialized;

        let mut site = walk::walk(&self.ctx)?;
        let diagnostics = enrich::enrich(&mut site, self.ctx.source(), &self.config.document)?;
        site.data = data::load_site_data(self.ctx.source())?;

        info!(
            source = %self.ctx.source().display(),
            documents = site.documents.len(),
            assets = site.assets.len(),
            site_data = site.data.len(),
            "prepared site"
        );

        self.diagnostics = diagnostics;
        self.state = State::Prepared;
        let site: &Site = self.site.insert(site);
        Ok(site)
    }

    /// Export the prepared site to the destination.
    ///
    /// Fails with [`PipelineError::NotPrepared`] before touching the
    /// filesystem if `prepare` has not succeeded.
    pub fn build(&mut self) -> Result<ExportSummary, PipelineError> {
        let site = self.site.as_ref().ok_or(PipelineError::NotPrepared)?;
        let summary = export::export(site, &self.ctx, &self.registry)?;
        self.state = State::Built;
        Ok(summary)
    }

    /// The prepared site, if `prepare` has succeeded.
    pub fn site(&self) -> Option<&Site> {
        self.site.as_ref()
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Warnings from the last successful `prepare`.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Reject destinations equal to the source or containing it.
fn check_destination(ctx: &BuildContext) -> Result<(), PipelineError> {
    let source = resolve_path(ctx.source());
    let destination = resolve_path(ctx.destination());
    if source.starts_with(&destination) {
        return Err(PipelineError::UnsafeDestination {
            destination: ctx.destination().to_path_buf(),
            source_dir: ctx.source().to_path_buf(),
        });
    }
    Ok(())
}
