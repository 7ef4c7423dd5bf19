//! Markdown to HTML via pulldown-cmark.
//!
//! The pulldown-cmark extensions for tables, strikethrough, task lists,
//! footnotes and `> [!NOTE]` blockquote alerts are on. Bare URLs are not
//! turned into links. Headings get an `id` derived from their text unless they
//! carry an explicit `{#id}`:
//!
//! ```text
//! # Getting Started     →  <h1 id="getting-started">
//! ## Setup              →  <h2 id="setup">
//! ## Setup              →  <h2 id="setup-1">
//! ## Custom {#mine}     →  <h2 id="mine">
//! ```

use super::{Engine, RenderError};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};
use std::collections::HashSet;

/// Id used when a heading's text produces an empty slug.
const FALLBACK_ID: &str = "heading";

#[derive(Debug, Clone)]
pub struct MarkdownEngine {
    options: Options,
    heading_ids: bool,
}

impl Default for MarkdownEngine {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MarkdownEngine {
    pub fn new(heading_ids: bool) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_GFM);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            options,
            heading_ids,
        }
    }

    /// Render markdown text to an HTML fragment.
    pub fn render_str(&self, text: &str) -> String {
        let parser = Parser::new_ext(text, self.options);
        let mut out = String::with_capacity(text.len() * 3 / 2);
        if self.heading_ids {
            html::push_html(&mut out, assign_heading_ids(parser).into_iter());
        } else {
            html::push_html(&mut out, parser);
        }
        out
    }
}

impl Engine for MarkdownEngine {
    fn render(&self, body: &[u8]) -> Result<Vec<u8>, RenderError> {
        Ok(self.render_str(&String::from_utf8_lossy(body)).into_bytes())
    }
}

/// Turn heading text into an id: lowercase, alphanumerics kept, everything
/// else collapsed into single dashes.
///
/// ```
/// assert_eq!(spindle::render::slugify("Hello, World!"), "hello-world");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Fill in missing heading ids.
///
/// Takes the whole event stream: every explicit `{#id}` in the document is
/// reserved before any automatic id is assigned.
fn assign_heading_ids<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut events: Vec<Event<'a>> = events.collect();
    let mut used: HashSet<String> = events
        .iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();

    for i in 0..events.len() {
        if !matches!(events[i], Event::Start(Tag::Heading { id: None, .. })) {
            continue;
        }

        let mut text = String::new();
        for event in &events[i + 1..] {
            match event {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(s) | Event::Code(s) => text.push_str(s),
                _ => {}
            }
        }

        let unique = unique_id(&mut used, slugify(&text));
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(unique.into());
        }
    }
    events
}

/// `base`, or `base-1`, `base-2`... whichever is free first. Marks it used.
fn unique_id(used: &mut HashSet<String>, base: String) -> String {
    let base = if base.is_empty() {
        FALLBACK_ID.to_string()
    } else {
        base
    };
    let mut id = base.clone();
    let mut n = 0;
    while used.contains(&id) {
        n += 1;
        id = format!("{base}-{n}");
    }
    used.insert(id.clone());
    id
}
