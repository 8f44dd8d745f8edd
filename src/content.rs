//! Content discovery and front matter parsing.
//!
//! Items are discovered by walking the content directory; traversal is
//! sorted so discovery order is deterministic across platforms. A file may
//! open with a `---`-fenced block of `key: value` front matter; everything
//! after the fence is the opaque body handed to the document renderer.

use crate::config::SiteConfig;
use crate::engine::{Identifier, Item, Metadata};
use crate::log;
use anyhow::{Context as _, Result};
use std::fs;
use std::sync::Arc;
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Discover content items under the content directory.
///
/// Items marked `draft: true` are skipped.
pub fn discover(config: &SiteConfig) -> Result<Vec<Arc<Item>>> {
    let content_dir = &config.build.content;
    let ext = config.build.content_ext.as_str();

    let mut items = Vec::new();
    for entry in WalkDir::new(content_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_str().unwrap_or_default();
        if IGNORED_FILES.contains(&name) || name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let rel = path
            .strip_prefix(content_dir)
            .with_context(|| format!("File outside content directory: {}", path.display()))?;
        let id = Identifier::new(rel.to_string_lossy());

        let (meta, body) = split_front_matter(&raw);
        if meta.get("draft") == Some("true") {
            log!("content"; "skipping draft `{id}`");
            continue;
        }

        items.push(Arc::new(Item::new(id, body.to_owned(), meta)));
    }
    Ok(items)
}

/// Split an optional `---`-fenced front matter block from the body.
///
/// Front matter lines are `key: value` pairs; values lose surrounding
/// whitespace and quotes. Malformed fences leave the whole input as body.
pub fn split_front_matter(raw: &str) -> (Metadata, &str) {
    let Some(rest) = raw
        .strip_prefix("---\n")
        .or_else(|| raw.strip_prefix("---\r\n"))
    else {
        return (Metadata::new(), raw);
    };

    let (block, body) = match rest
        .split_once("\n---\n")
        .or_else(|| rest.split_once("\r\n---\r\n"))
    {
        Some(split) => split,
        // A file may end directly after the closing fence.
        None => match rest.strip_suffix("\n---") {
            Some(block) => (block, ""),
            None => return (Metadata::new(), raw),
        },
    };

    let mut meta = Metadata::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            meta.insert(key.trim().to_owned(), value.trim().trim_matches('"').to_owned());
        }
    }
    (meta, body)
}

// ============================================================================
// Tests
// ============================================================================
