//! Site configuration module.
//!
//! Handles loading, validating, and merging the `_config.toml` file in the
//! source root. The leading underscore keeps the config out of the walk, so it
//! never lands in the built site.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! destination = "_site"     # Build output, relative to the source root
//!
//! [document]
//! title = ""                # Title for documents that do not set one
//! excerpt = ""              # Excerpt for documents that do not set one
//! url = ""                  # URL for documents that do not set one
//!
//! [markdown]
//! heading_ids = true        # Give every heading an `id` attribute
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse, override just the values you want:
//!
//! ```toml
//! destination = "public"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file inside the source root.
pub const CONFIG_FILE: &str = "_config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `_config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Build output directory. Relative paths resolve against the source root.
    #[serde(default = "default_destination")]
    pub destination: String,
    /// Fallback values for documents missing the well-known keys.
    pub document: DocumentDefaults,
    /// Markdown rendering options.
    pub markdown: MarkdownConfig,
}

fn default_destination() -> String {
    "_site".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            document: DocumentDefaults::default(),
            markdown: MarkdownConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.destination.trim().is_empty() {
            return Err(ConfigError::Validation(
                "destination must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Placeholders lifted into a document when its metadata lacks the key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentDefaults {
    pub title: String,
    pub excerpt: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Generate `id` attributes for headings that have none.
    pub heading_ids: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self { heading_ids: true }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `_config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no config file exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `_config.toml` in the given source root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `_config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Spindle Configuration
# =====================
# Place this file in the source root as `_config.toml`.
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Build output directory. Relative paths resolve against the source root.
# Everything inside it is deleted at the start of every build.
destination = "_site"

# ---------------------------------------------------------------------------
# Document defaults
# ---------------------------------------------------------------------------
# Used when a document's frontmatter and companion data do not set the key.
[document]
title = ""
excerpt = ""
url = ""

# ---------------------------------------------------------------------------
# Markdown rendering
# ---------------------------------------------------------------------------
[markdown]
# Give every heading an `id` derived from its text. Explicit `{#id}`
# attributes always win. Duplicates get `-1`, `-2`, ... suffixes.
heading_ids = true
"##
}
