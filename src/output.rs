//! CLI output formatting for both pipeline phases.
//!
//! # Information-First Display
//!
//! Documents are listed by title, with their source path as indented context.
//! Untitled documents fall back to their file name in parentheses so every line
//! still identifies something. Assets have no title and are listed by path.
//!
//! # Output Format
//!
//! ## Prepare (`check`, and the first half of `build`)
//!
//! ```text
//! Documents
//! 001 Welcome
//!     Source: README.md
//! 002 (notes.md)
//!     Source: blog/notes.md
//!     Excerpt: A short summary of the...
//!
//! Assets
//! 001 img/logo.png
//!
//! Data
//!     authors
//!
//! Warnings
//!     blog/notes.md: could not parse created timestamp 'soon' with any known format
//! ```
//!
//! ## Build
//!
//! ```text
//! 001 Welcome → index.html
//! 002 (notes.md) → blog/notes.html
//! 001 img/logo.png
//!
//! Exported 2 documents, 1 asset (5120 bytes) to _site
//! ```
//!
//! # Architecture
//!
//! Each phase has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::enrich::Diagnostic;
use crate::export::ExportSummary;
use crate::types::{Document, Site};
use std::path::Path;

const EXCERPT_WIDTH: usize = 40;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Titled documents show the title, untitled show the file name in parens.
///
/// ```text
/// 001 Getting Started   // titled
/// 002 (notes.md)        // untitled
/// ```
fn document_line(index: usize, doc: &Document) -> String {
    if doc.title.is_empty() {
        format!("{} ({})", format_index(index), doc.entry.name)
    } else {
        format!("{} {}", format_index(index), doc.title)
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

// ============================================================================
// Prepare output
// ============================================================================

/// Format the prepared site as an inventory of documents, assets, and data.
pub fn format_site_output(site: &Site) -> Vec<String> {
    let mut lines = Vec::new();

    if !site.documents.is_empty() {
        lines.push("Documents".to_string());
        for (i, doc) in site.documents.iter().enumerate() {
            lines.push(document_line(i + 1, doc));
            lines.push(format!(
                "{}Source: {}",
                indent(1),
                display(&doc.entry.relative_path())
            ));
            if !doc.excerpt.is_empty() {
                let excerpt = truncate(doc.excerpt.trim(), EXCERPT_WIDTH);
                lines.push(format!("{}Excerpt: {}", indent(1), excerpt));
            }
        }
    }

    if !site.assets.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Assets".to_string());
        for (i, asset) in site.assets.iter().enumerate() {
            lines.push(format!(
                "{} {}",
                format_index(i + 1),
                display(&asset.entry.relative_path())
            ));
        }
    }

    if !site.data.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Data".to_string());
        for key in site.data.keys() {
            lines.push(format!("{}{}", indent(1), key));
        }
    }

    if lines.is_empty() {
        lines.push("No documents or assets found".to_string());
    }

    lines
}

/// Print prepare output to stdout.
pub fn print_site_output(site: &Site) {
    for line in format_site_output(site) {
        println!("{}", line);
    }
}

/// Format non-fatal warnings under a `Warnings` header. Empty input, no lines.
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> Vec<String> {
    if diagnostics.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![String::new(), "Warnings".to_string()];
    lines.extend(diagnostics.iter().map(|d| format!("{}{}", indent(1), d)));
    lines
}

/// Print warnings to stdout.
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for line in format_diagnostics(diagnostics) {
        println!("{}", line);
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format what an export wrote: each document with its output path, each
/// asset, then a totals line.
pub fn format_export_output(site: &Site, summary: &ExportSummary) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, doc) in site.documents.iter().enumerate() {
        lines.push(format!(
            "{} \u{2192} {}",
            document_line(i + 1, doc),
            display(&doc.destination_path(Path::new("")))
        ));
    }
    for (i, asset) in site.assets.iter().enumerate() {
        lines.push(format!(
            "{} {}",
            format_index(i + 1),
            display(&asset.entry.relative_path())
        ));
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Exported {}, {} ({} bytes) to {}",
        plural(summary.documents, "document"),
        plural(summary.assets, "asset"),
        summary.bytes,
        display(&summary.destination)
    ));

    lines
}

/// Print build output to stdout.
pub fn print_export_output(site: &Site, summary: &ExportSummary) {
    for line in format_export_output(site, summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
