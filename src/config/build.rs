//! `[build]` section configuration.
//!
//! Contains pipeline settings: paths, extensions, the external renderer, the
//! feed, tag pages, sitemap, and manifest outputs.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in weft.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"      # Source directory
/// output = "public"        # Output directory
/// minify = true
///
/// [build.renderer]
/// command = ["pandoc", "--from", "markdown", "--to", "html"]
///
/// [build.feed]
/// enable = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content source directory.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Template directory for the substitution collaborator.
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: PathBuf,

    /// Extension of content source files.
    #[serde(default = "defaults::build::content_ext")]
    #[educe(Default = defaults::build::content_ext())]
    pub content_ext: String,

    /// Extension of published pages.
    #[serde(default = "defaults::build::publish_ext")]
    #[educe(Default = defaults::build::publish_ext())]
    pub publish_ext: String,

    /// Treat overlapping patterns within a rule set as a fatal error.
    /// When false, the first registered rule wins (a documented footgun).
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub strict_patterns: bool,

    /// Clear the output directory before each build.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Minify HTML/XML output.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,

    /// External document renderer settings.
    #[serde(default)]
    pub renderer: RendererConfig,

    /// Syndication feed settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Tag index and tag page settings.
    #[serde(default)]
    pub tags: TagsConfig,

    /// Sitemap generation settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// Site manifest (JSON page index) settings.
    #[serde(default)]
    pub manifest: ManifestConfig,
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[build.renderer]` section - the external document parser.
///
/// The item body is piped to this command's stdin; rendered HTML is read from
/// stdout. An empty command passes content through untouched.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RendererConfig {
    #[serde(default = "defaults::build::renderer::command")]
    #[educe(Default = defaults::build::renderer::command())]
    pub command: Vec<String>,
}

/// `[build.feed]` section - syndication feed generation.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    /// Output path for the feed, relative to the output directory.
    #[serde(default = "defaults::build::feed::path")]
    #[educe(Default = defaults::build::feed::path())]
    pub path: PathBuf,

    /// Maximum number of entries; unset means all dated posts.
    #[serde(default = "defaults::build::feed::limit")]
    #[educe(Default = defaults::build::feed::limit())]
    pub limit: Option<usize>,
}

/// `[build.tags]` section - the tag index and per-tag listing pages.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct TagsConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Metadata field holding the tag list.
    #[serde(default = "defaults::build::tags::field")]
    #[educe(Default = defaults::build::tags::field())]
    pub field: String,

    /// Delimiter splitting the field into individual tags (one character).
    #[serde(default = "defaults::build::tags::delimiter")]
    #[educe(Default = defaults::build::tags::delimiter())]
    pub delimiter: String,

    /// Route template for tag pages; `{tag}` is the sanitized segment.
    #[serde(default = "defaults::build::tags::route")]
    #[educe(Default = defaults::build::tags::route())]
    pub route: String,

    /// Template id used to render tag pages.
    #[serde(default = "defaults::build::tags::template")]
    #[educe(Default = defaults::build::tags::template())]
    pub template: String,
}

/// `[build.sitemap]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    #[serde(default = "defaults::build::sitemap::path")]
    #[educe(Default = defaults::build::sitemap::path())]
    pub path: PathBuf,
}

/// `[build.manifest]` section - JSON index of built pages for external tools.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ManifestConfig {
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    #[serde(default = "defaults::build::manifest::path")]
    #[educe(Default = defaults::build::manifest::path())]
    pub path: PathBuf,
}
