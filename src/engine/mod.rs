//! The build engine underneath the site pipeline.
//!
//! - **pattern**: identifiers and glob matching with captures
//! - **rules**: rule sets binding patterns to routes and chains
//! - **compiler**: ordered transformation chains with snapshot capture
//! - **context**: per-run state (items, snapshot cache, tag index)
//! - **route**: identifier → output path resolution
//! - **error**: the build error taxonomy
//!
//! # Data Flow
//!
//! ```text
//! discover() ──► Registry::plan() ──► Chain::run() ──► write
//!      │               │                   │
//!      ▼               ▼                   ▼
//!   Item[]        Job[] (routes       SnapshotStore,
//!                 checked first)      TagIndex
//! ```

pub mod compiler;
pub mod context;
pub mod error;
pub mod item;
pub mod metadata;
pub mod pattern;
pub mod route;
pub mod rules;

pub use compiler::{Chain, StepCx};
pub use context::{BuildContext, DataAccess};
pub use error::BuildError;
pub use item::Item;
pub use metadata::{Metadata, MetadataError};
pub use pattern::{Identifier, Pattern, PatternError};
pub use route::Route;
pub use rules::{Job, Registry, Rule, RuleSet};
