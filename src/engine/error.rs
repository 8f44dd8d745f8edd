//! Build error taxonomy.
//!
//! Structural errors (ambiguous patterns, route and tag collisions) indicate
//! a broken site topology and are fatal during validation, before anything is
//! written. Per item × rule failures are isolated and collected so one bad
//! post cannot block publishing the rest; the run still exits non-zero and
//! lists every collected error.

use crate::engine::pattern::Identifier;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("rule set `{set}`: patterns `{first}` and `{second}` overlap; registration order would decide which wins")]
    AmbiguousRule {
        set: String,
        first: String,
        second: String,
    },

    #[error("snapshot `{name}` of `{id}` loaded before any rule captured it; producers must be scheduled first")]
    SnapshotNotFound { id: Identifier, name: String },

    #[error("route collision on `{route}`: `{first}` and `{second}` both resolve there")]
    RouteCollision {
        route: String,
        first: Identifier,
        second: Identifier,
    },

    #[error("tags `{first}` and `{second}` both sanitize to path segment `{segment}`")]
    TagCollision {
        segment: String,
        first: String,
        second: String,
    },

    #[error("`{id}` failed at step {step} of rule `{rule}`: {source:#}")]
    CompilerStep {
        id: Identifier,
        rule: String,
        step: usize,
        source: anyhow::Error,
    },

    #[error("failed to write `{route}`: {source}")]
    Write {
        route: String,
        #[source]
        source: std::io::Error,
    },
}
