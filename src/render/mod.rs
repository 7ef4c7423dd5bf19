//! Render engines and the registry that dispatches to them.
//!
//! The [`Engine`] trait turns a document body into output bytes. An
//! [`EngineRegistry`] maps source extensions (with the leading dot) to boxed
//! engines, so the exporter never needs to know which formats exist.
//!
//! The default registry knows one engine:
//!
//! | Extension | Engine | Output |
//! |-----------|--------|--------|
//! | `.md` | [`MarkdownEngine`] | HTML fragment |
//!
//! Engines receive the body with frontmatter already removed.

mod markdown;

pub use markdown::{MarkdownEngine, slugify};

use crate::walk::MARKDOWN_EXTENSION;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no render engine registered for '{extension}' files")]
    Unsupported { extension: String },
    #[error("Rendering failed: {0}")]
    Failed(String),
}

/// Trait for render engines.
pub trait Engine: Send + Sync {
    /// Render a document body.
    fn render(&self, body: &[u8]) -> Result<Vec<u8>, RenderError>;
}

/// Engines keyed by source extension, e.g. `.md`.
pub struct EngineRegistry {
    engines: BTreeMap<String, Box<dyn Engine>>,
}

impl EngineRegistry {
    /// A registry with no engines. Every render is `Unsupported`.
    pub fn new() -> Self {
        Self {
            engines: BTreeMap::new(),
        }
    }

    /// A registry with `engine` handling `.md` files.
    pub fn with_markdown(engine: MarkdownEngine) -> Self {
        let mut registry = Self::new();
        registry.register(MARKDOWN_EXTENSION, engine);
        registry
    }

    /// Register `engine` for `extension`, replacing any previous one.
    pub fn register(&mut self, extension: impl Into<String>, engine: impl Engine + 'static) {
        self.engines.insert(extension.into(), Box::new(engine));
    }

    pub fn get(&self, extension: &str) -> Option<&dyn Engine> {
        self.engines.get(extension).map(|e| e.as_ref())
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.engines.contains_key(extension)
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }

    /// Render `body` with the engine registered for `extension`.
    pub fn render(&self, extension: &str, body: &[u8]) -> Result<Vec<u8>, RenderError> {
        let engine = self.get(extension).ok_or_else(|| RenderError::Unsupported {
            extension: extension.to_string(),
        })?;
        engine.render(body)
    }
}

impl Default for EngineRegistry {
    /// Markdown only, with heading ids on.
    fn default() -> Self {
        Self::with_markdown(MarkdownEngine::default())
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("extensions", &self.engines.keys().collect::<Vec<_>>())
            .finish()
    }
}
