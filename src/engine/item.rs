//! Content items flowing through the pipeline.

use crate::engine::metadata::Metadata;
use crate::engine::pattern::Identifier;

/// One content unit: identifier, raw body, and front-matter metadata.
///
/// Items are created at discovery time and live for exactly one build run;
/// compiled forms are held in the snapshot cache, never on the item itself.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: Identifier,
    pub body: String,
    pub meta: Metadata,
}

impl Item {
    pub fn new(id: Identifier, body: String, meta: Metadata) -> Self {
        Self { id, body, meta }
    }

    /// Title metadata, falling back to the identifier.
    pub fn title(&self) -> &str {
        self.meta.get("title").unwrap_or(self.id.as_str())
    }
}
