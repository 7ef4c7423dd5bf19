//! # Spindle
//!
//! A small static site generator. The source directory is the site: markdown
//! files become HTML pages, every other file is copied as is, and the output
//! mirrors the source layout.
//!
//! # Architecture: Two-Phase Pipeline
//!
//! A [`pipeline::Pipeline`] moves through two phases, each usable on its own:
//!
//! ```text
//! 1. Prepare   source/  →  Site             (walk + enrich, nothing written)
//! 2. Build     Site     →  destination/     (clean, render, copy)
//! ```
//!
//! The prepared [`types::Site`] is plain serializable data, so it can be
//! inspected (`spindle build --dry-run`) before anything touches the disk, and
//! built more than once without re-reading the source.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`walk`] | Prepare, step 1: traverses the source tree and classifies files as documents or assets |
//! | [`enrich`] | Prepare, step 2: merges companion data and frontmatter, lifts well-known keys |
//! | [`frontmatter`] | Splits a `---` delimited YAML block off the top of a document |
//! | [`data`] | Companion `_<name>.yaml` files and the site-wide `_data/` directory |
//! | [`render`] | `Engine` trait, the engine registry, and the markdown engine |
//! | [`export`] | Build: cleans the destination, writes rendered documents, copies assets |
//! | [`pipeline`] | Owns the build state and sequences the phases |
//! | [`config`] | `_config.toml` loading, validation, and merging over stock defaults |
//! | [`types`] | Shared types: `Entry`, `Document`, `Asset`, `Site`, `BuildContext` |
//! | [`output`] | CLI output formatting for prepare and build results |
//!
//! # Design Decisions
//!
//! ## Metadata Layers
//!
//! Every file may have a companion YAML file next to it; documents may also
//! carry frontmatter. Both merge into one mapping, frontmatter on top:
//!
//! ```text
//! blog/_post.yaml   author: Kim          ┐
//!                   title: Draft         ├─→ author: Kim, title: Hello
//! blog/post.md      ---                  │
//!                   title: Hello         ┘
//!                   ---
//! ```
//!
//! `title`, `excerpt`, `url` and `created` are then lifted out of the mapping
//! into typed fields, so templates and tooling never have to guess their type.
//!
//! ## Underscore Means Private
//!
//! Names starting with `_` or `.` never reach the output. The same rule covers
//! drafts (`_drafts/`), data (`_data/`, `_post.yaml`), config (`_config.toml`)
//! and the default destination (`_site/`), so there is nothing else to
//! configure.
//!
//! ## Engines Behind a Trait
//!
//! Rendering goes through [`render::EngineRegistry`], keyed by source
//! extension. The exporter asks the registry, never a hard-coded match, so a
//! new format is one `register` call. An extension without an engine is a
//! [`render::RenderError::Unsupported`] error, not a panic.
//!
//! ## Clean Builds Only
//!
//! Every build deletes the destination first. There is no incremental mode and
//! no stale file can survive a rebuild. Because of that, a destination equal to
//! or above the source directory is refused up front.

pub mod config;
pub mod data;
pub mod enrich;
pub mod export;
pub mod frontmatter;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod types;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_helpers;
