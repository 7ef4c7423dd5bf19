//! Frontmatter extraction for documents.
//!
//! A document may start with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! created: 2023-12-01
//! ---
//! # The body starts here
//! ```
//!
//! [`parse_frontmatter`] splits such a document into its metadata and the
//! remaining body. It is a pure function over bytes; the caller attaches the
//! document path to any error.
//!
//! Absence and emptiness are different results: a document without a block
//! yields `data: None`, a block with nothing in it yields `Some` of an empty
//! mapping. An opening fence that is never closed is not a block at all, and
//! the whole input is returned untouched as the body.

use crate::data::{YamlError, parse_mapping};
use crate::types::Metadata;
use thiserror::Error;

/// A line consisting of exactly this token (ignoring surrounding whitespace)
/// opens and closes a frontmatter block.
pub const DELIMITER: &[u8] = b"---";

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("frontmatter is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("invalid frontmatter YAML: {0}")]
    Yaml(#[from] YamlError),
}

/// A document split into metadata and body.
#[derive(Debug, PartialEq)]
pub struct Frontmatter<'a> {
    /// `None` when the document has no frontmatter block
    pub data: Option<Metadata>,
    /// Everything after the closing delimiter line, or the full input
    pub body: &'a [u8],
}

/// Split `raw` into frontmatter metadata and body.
pub fn parse_frontmatter(raw: &[u8]) -> Result<Frontmatter<'_>, FrontmatterError> {
    let absent = Frontmatter {
        data: None,
        body: raw,
    };

    let mut lines = raw.split_inclusive(|&b| b == b'\n');
    let block_start = match lines.next() {
        Some(first) if first.trim_ascii() == DELIMITER => first.len(),
        _ => return Ok(absent),
    };
    let mut offset = block_start;

    for line in lines {
        if line.trim_ascii() == DELIMITER {
            let block = std::str::from_utf8(&raw[block_start..offset])?;
            let data = parse_mapping(block)?;
            return Ok(Frontmatter {
                data: Some(data),
                body: &raw[offset + line.len()..],
            });
        }
        offset += line.len();
    }

    Ok(absent)
}
